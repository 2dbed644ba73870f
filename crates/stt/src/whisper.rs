use std::path::Path;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::{Segment, SttEngine};

/// whisper.cpp-backed engine.
///
/// Language and the speech-energy gate are fixed at load time; the context
/// hint varies per call.
pub struct WhisperEngine {
    context: WhisperContext,
    model_name: String,
    language: Option<String>,
    vad: bool,
    threads: i32,
}

impl WhisperEngine {
    pub fn load(
        model_path: impl AsRef<Path>,
        language: Option<String>,
        vad: bool,
    ) -> crate::Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(crate::SttError::ModelNotFound(model_path.to_path_buf()));
        }

        let path_str = model_path
            .to_str()
            .ok_or_else(|| crate::SttError::ModelLoad("model path is not valid unicode".into()))?;
        let context =
            WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
                .map_err(|e| crate::SttError::ModelLoad(e.to_string()))?;

        let model_name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "whisper".to_string());

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().min(8))
            .unwrap_or(4) as i32;

        tracing::info!(model = %model_name, threads, vad, "whisper model loaded");

        Ok(Self {
            context,
            model_name,
            language,
            vad,
            threads,
        })
    }
}

impl SttEngine for WhisperEngine {
    fn transcribe(&self, audio: &[f32], hint: Option<&str>) -> crate::Result<Vec<Segment>> {
        if audio.is_empty() {
            return Ok(Vec::new());
        }
        if self.vad && !crate::vad::has_speech_energy(audio) {
            tracing::debug!(samples = audio.len(), "window below speech energy floor");
            return Ok(Vec::new());
        }

        let mut state = self
            .context
            .create_state()
            .map_err(|e| crate::SttError::TranscriptionFailed(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.threads);
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_suppress_blank(true);
        params.set_no_context(true);
        if let Some(lang) = self.language.as_deref() {
            params.set_language(Some(lang));
        }
        if let Some(hint) = hint {
            if !hint.trim().is_empty() {
                params.set_initial_prompt(hint);
            }
        }

        state
            .full(params, audio)
            .map_err(|e| crate::SttError::TranscriptionFailed(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| crate::SttError::TranscriptionFailed(e.to_string()))?;

        let mut segments = Vec::with_capacity(n_segments as usize);
        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| crate::SttError::TranscriptionFailed(e.to_string()))?;
            if text.trim().is_empty() {
                continue;
            }
            let t0 = state
                .full_get_segment_t0(i)
                .map_err(|e| crate::SttError::TranscriptionFailed(e.to_string()))?;
            let t1 = state
                .full_get_segment_t1(i)
                .map_err(|e| crate::SttError::TranscriptionFailed(e.to_string()))?;

            // whisper reports timestamps in centiseconds
            segments.push(Segment {
                text,
                start_ms: t0.max(0) as u64 * 10,
                end_ms: t1.max(0) as u64 * 10,
            });
        }

        tracing::debug!(
            window_samples = audio.len(),
            segments = segments.len(),
            hinted = hint.is_some(),
            "transcription complete"
        );

        Ok(segments)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
