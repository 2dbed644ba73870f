//! Session lifecycle: the shared run flag and the three execution units.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use habla_audio::{AudioChunk, CaptureStream, Chunker};
use habla_broadcast::BroadcastServer;
use habla_queue::{queue, QueueReceiver, QueueSender};
use habla_stt::SttEngine;

use crate::worker::{TranscriptUpdate, TranscriptionWorker};
use crate::{PromptMemory, SessionConfig};

/// How often the capture loop re-checks the run flag while the device is
/// quiet. Bounds how long a stop request can go unobserved.
const CAPTURE_POLL: Duration = Duration::from_millis(100);

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    NotStarted = 0,
    Running = 1,
    Stopped = 2,
}

/// Shared tri-state flag coordinating the execution units.
///
/// Setting `Stopped` is the only cancellation signal; every unit observes it
/// cooperatively between blocking operations.
#[derive(Debug, Default)]
pub struct SessionFlag(AtomicU8);

impl SessionFlag {
    pub fn new() -> Self {
        Self(AtomicU8::new(SessionState::NotStarted as u8))
    }

    pub fn set(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    pub fn get(&self) -> SessionState {
        match self.0.load(Ordering::SeqCst) {
            1 => SessionState::Running,
            2 => SessionState::Stopped,
            _ => SessionState::NotStarted,
        }
    }

    pub fn is_running(&self) -> bool {
        self.get() == SessionState::Running
    }

    /// Request cooperative shutdown.
    pub fn stop(&self) {
        self.set(SessionState::Stopped);
    }
}

/// A running transcription session.
pub struct SessionHandle {
    flag: Arc<SessionFlag>,
    results: Option<QueueReceiver<TranscriptUpdate>>,
    capture: Option<JoinHandle<()>>,
    worker: Option<JoinHandle<crate::Result<()>>>,
    broadcast: Option<BroadcastServer>,
}

impl SessionHandle {
    pub fn flag(&self) -> Arc<SessionFlag> {
        self.flag.clone()
    }

    /// Take the result stream (can only be called once).
    pub fn take_results(&mut self) -> Option<QueueReceiver<TranscriptUpdate>> {
        self.results.take()
    }

    /// Signal shutdown and wait for the units to drain.
    ///
    /// Completes only after the sentinel has propagated through the chunk
    /// queue and the worker has exited; broadcast teardown is bounded by its
    /// own grace period. Returns the worker's outcome.
    pub fn stop(mut self) -> crate::Result<()> {
        self.flag.stop();
        if let Some(capture) = self.capture.take() {
            let _ = capture.join();
        }
        let result = match self.worker.take() {
            Some(worker) => worker.join().unwrap_or(Ok(())),
            None => Ok(()),
        };
        if let Some(server) = self.broadcast.take() {
            server.shutdown();
        }
        result
    }
}

pub struct Session;

impl Session {
    /// Start the capture, transcription and (optionally) broadcast units.
    ///
    /// Fails before the flag ever reaches `Running` if the device cannot be
    /// opened or the broadcast endpoint cannot bind, so a missing microphone
    /// is a startup error, never a half-started session.
    pub fn start(
        config: &SessionConfig,
        engine: Arc<dyn SttEngine>,
    ) -> crate::Result<SessionHandle> {
        config.validate()?;

        let broadcast = match &config.broadcast {
            Some(endpoint) => Some(BroadcastServer::start(endpoint)?),
            None => None,
        };
        let registry = broadcast.as_ref().map(|server| server.registry());

        let flag = Arc::new(SessionFlag::new());
        let (chunk_tx, chunk_rx) = queue::<AudioChunk>();
        let (result_tx, result_rx) = queue::<TranscriptUpdate>();

        // The capture thread owns the device stream (the stream is not Send);
        // it reports startup success or failure back before the session is
        // considered running.
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<habla_audio::Result<()>>(1);
        let capture_flag = flag.clone();
        let device = config.device.clone();
        let capture = std::thread::Builder::new()
            .name("capture".into())
            .spawn(move || capture_loop(device, capture_flag, chunk_tx, ready_tx))
            .map_err(|e| {
                habla_audio::AudioError::StreamError(format!("failed to spawn capture thread: {e}"))
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = capture.join();
                if let Some(server) = broadcast {
                    server.shutdown();
                }
                return Err(e.into());
            }
            Err(_) => {
                let _ = capture.join();
                if let Some(server) = broadcast {
                    server.shutdown();
                }
                return Err(habla_audio::AudioError::StreamError(
                    "capture thread exited during startup".into(),
                )
                .into());
            }
        }

        let memory = PromptMemory::new(config.memory, config.initial_prompt.clone());
        let worker = TranscriptionWorker::new(
            engine,
            memory,
            config.patience_ms,
            chunk_rx,
            result_tx,
            registry,
        );
        let worker_flag = flag.clone();
        let worker = std::thread::Builder::new()
            .name("transcription".into())
            .spawn(move || {
                let result = worker.run();
                // A recognizer fault ends the session; the capture unit must
                // observe the stop on its next poll.
                worker_flag.stop();
                result
            })
            .map_err(|e| {
                habla_audio::AudioError::StreamError(format!(
                    "failed to spawn transcription thread: {e}"
                ))
            })?;

        flag.set(SessionState::Running);
        tracing::info!("session running");

        Ok(SessionHandle {
            flag,
            results: Some(result_rx),
            capture: Some(capture),
            worker: Some(worker),
            broadcast,
        })
    }
}

/// The capture unit: the only code that reads the capture device.
///
/// Drains the device callback channel, re-slices into fixed-size chunks and
/// feeds the chunk queue while the flag allows it; on any transition away
/// from running it pushes the sentinel and exits.
fn capture_loop(
    device: Option<String>,
    flag: Arc<SessionFlag>,
    chunks: QueueSender<AudioChunk>,
    ready: crossbeam_channel::Sender<habla_audio::Result<()>>,
) {
    let mut stream = match CaptureStream::open(device.as_deref()) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let samples_rx = match stream.take_receiver() {
        Some(rx) => rx,
        None => {
            let _ = ready.send(Err(habla_audio::AudioError::StreamError(
                "capture receiver already taken".into(),
            )));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let mut chunker = Chunker::new();
    while flag.get() != SessionState::Stopped {
        match samples_rx.recv_timeout(CAPTURE_POLL) {
            Ok(samples) => {
                for chunk in chunker.push(&samples) {
                    chunks.put(chunk);
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("capture stream ended unexpectedly");
                break;
            }
        }
    }

    chunks.close();
    tracing::debug!(pending_samples = chunker.pending_len(), "capture unit exited");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_starts_not_started() {
        let flag = SessionFlag::new();
        assert_eq!(flag.get(), SessionState::NotStarted);
        assert!(!flag.is_running());
    }

    #[test]
    fn test_flag_transitions() {
        let flag = SessionFlag::new();
        flag.set(SessionState::Running);
        assert!(flag.is_running());

        flag.stop();
        assert_eq!(flag.get(), SessionState::Stopped);
        assert!(!flag.is_running());
    }

    #[test]
    fn test_flag_is_shareable() {
        let flag = Arc::new(SessionFlag::new());
        let shared = flag.clone();
        let handle = std::thread::spawn(move || shared.stop());
        handle.join().unwrap();
        assert_eq!(flag.get(), SessionState::Stopped);
    }
}
