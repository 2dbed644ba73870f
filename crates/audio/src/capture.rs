use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream};
use crossbeam_channel::{Receiver, Sender};

use crate::SAMPLE_RATE;

/// A live microphone stream delivering 16 kHz mono f32 buffers.
///
/// The cpal callback folds to mono, resamples and sends into an unbounded
/// channel; dropping the stream stops the callbacks and disconnects the
/// receiver. `cpal::Stream` is not `Send`, so the stream must stay on the
/// thread that opened it.
pub struct CaptureStream {
    _stream: Stream,
    receiver: Option<Receiver<Vec<f32>>>,
}

impl CaptureStream {
    /// Open a capture device. `None` selects the system default; otherwise
    /// the first device whose name contains `device_name` (case-insensitive)
    /// is used.
    pub fn open(device_name: Option<&str>) -> crate::Result<Self> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(query) => {
                let needle = query.to_lowercase();
                host.input_devices()?
                    .find(|d| {
                        d.name()
                            .map(|n| n.to_lowercase().contains(&needle))
                            .unwrap_or(false)
                    })
                    .ok_or_else(|| crate::AudioError::DeviceNotFound(query.to_string()))?
            }
            None => host
                .default_input_device()
                .ok_or_else(|| crate::AudioError::DeviceNotFound("default".to_string()))?,
        };

        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let (tx, rx) = crossbeam_channel::unbounded::<Vec<f32>>();
        let stream = build_stream(device, tx)?;
        tracing::info!(device = %name, "capture stream started");

        Ok(Self {
            _stream: stream,
            receiver: Some(rx),
        })
    }

    /// Take the receiver out of this stream (can only be called once).
    ///
    /// The receiver supports blocking `recv()` and `recv_timeout()` for
    /// single-consumer use without polling.
    pub fn take_receiver(&mut self) -> Option<Receiver<Vec<f32>>> {
        self.receiver.take()
    }
}

fn build_stream(device: Device, tx: Sender<Vec<f32>>) -> crate::Result<Stream> {
    let config = device.default_input_config().map_err(|e| {
        crate::AudioError::StreamError(format!("failed to get default config: {e}"))
    })?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;

    let stream = match config.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &config.into(),
            move |data: &[f32], _| {
                let _ = tx.send(process_audio(data, channels, sample_rate));
            },
            |err| tracing::error!("audio stream error: {}", err),
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &config.into(),
            move |data: &[i16], _| {
                let float: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                let _ = tx.send(process_audio(&float, channels, sample_rate));
            },
            |err| tracing::error!("audio stream error: {}", err),
            None,
        )?,
        format => {
            return Err(crate::AudioError::StreamError(format!(
                "unsupported sample format: {format:?}"
            )));
        }
    };

    stream
        .play()
        .map_err(|e| crate::AudioError::StreamError(format!("failed to start stream: {e}")))?;

    Ok(stream)
}

/// Fold to mono and resample to the pipeline rate in one pass.
fn process_audio(samples: &[f32], channels: usize, from_rate: u32) -> Vec<f32> {
    let mono = if channels > 1 {
        to_mono(samples, channels)
    } else {
        samples.to_vec()
    };

    if from_rate == SAMPLE_RATE {
        mono
    } else {
        resample_linear(&mono, from_rate, SAMPLE_RATE)
    }
}

#[inline]
fn to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    let mut output = Vec::with_capacity(samples.len() / channels);
    let inv_channels = 1.0 / channels as f32;

    for frame in samples.chunks_exact(channels) {
        let sum: f32 = frame.iter().sum();
        output.push(sum * inv_channels);
    }
    output
}

/// Linear interpolation resampling.
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio) as usize;
    let mut output = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_idx = i as f64 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = src_idx.fract() as f32;
        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };
        output.push(sample);
    }
    output
}
