use cpal::traits::{DeviceTrait, HostTrait};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AudioDevice {
    pub name: String,
    pub is_default: bool,
}

pub fn list_devices() -> crate::Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let mut devices = Vec::new();
    for device in host.input_devices()? {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let is_default = default_name.as_ref() == Some(&name);
        devices.push(AudioDevice { name, is_default });
    }

    Ok(devices)
}

pub fn get_default_device() -> crate::Result<Option<AudioDevice>> {
    let host = cpal::default_host();
    match host.default_input_device() {
        Some(device) => {
            let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
            Ok(Some(AudioDevice {
                name,
                is_default: true,
            }))
        }
        None => Ok(None),
    }
}

/// Find an input device whose name contains `query`, case-insensitively.
pub fn find_device(query: &str) -> crate::Result<AudioDevice> {
    let needle = query.to_lowercase();
    list_devices()?
        .into_iter()
        .find(|d| d.name.to_lowercase().contains(&needle))
        .ok_or_else(|| crate::AudioError::DeviceNotFound(query.to_string()))
}
