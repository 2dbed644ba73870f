//! Energy-based speech gate.

/// RMS level below which a window is treated as silence.
const SPEECH_RMS_THRESHOLD: f32 = 0.01;

/// Returns true when `samples` carry enough energy to be worth decoding.
pub(crate) fn has_speech_energy(samples: &[f32]) -> bool {
    if samples.is_empty() {
        return false;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    let rms = (sum_sq / samples.len() as f32).sqrt();
    rms >= SPEECH_RMS_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_gated() {
        assert!(!has_speech_energy(&[0.0; 16000]));
        assert!(!has_speech_energy(&[]));
    }

    #[test]
    fn test_speech_passes() {
        let tone: Vec<f32> = (0..16000)
            .map(|i| (i as f32 * 0.05).sin() * 0.2)
            .collect();
        assert!(has_speech_energy(&tone));
    }

    #[test]
    fn test_low_noise_floor_is_gated() {
        assert!(!has_speech_energy(&[0.002; 16000]));
    }
}
