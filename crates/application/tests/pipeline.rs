//! Worker-level pipeline tests with a scripted recognizer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use habla_application::{PromptMemory, TranscriptUpdate, TranscriptionWorker};
use habla_audio::AudioChunk;
use habla_broadcast::{ClientRegistry, WireMessage};
use habla_queue::{queue, StreamItem};
use habla_stt::{Segment, SttEngine, SttError};

/// 500 ms of audio at 16 kHz.
const HALF_SECOND: usize = 8000;

fn seg(text: &str, start_ms: u64, end_ms: u64) -> Segment {
    Segment {
        text: text.to_string(),
        start_ms,
        end_ms,
    }
}

/// Replays a fixed sequence of recognizer results and records the hints it
/// was given.
struct ScriptedEngine {
    script: Mutex<VecDeque<Result<Vec<Segment>, SttError>>>,
    hints: Mutex<Vec<Option<String>>>,
}

impl ScriptedEngine {
    fn new(script: Vec<Result<Vec<Segment>, SttError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            hints: Mutex::new(Vec::new()),
        })
    }

    fn hints(&self) -> Vec<Option<String>> {
        self.hints.lock().unwrap().clone()
    }
}

impl SttEngine for ScriptedEngine {
    fn transcribe(&self, _audio: &[f32], hint: Option<&str>) -> Result<Vec<Segment>, SttError> {
        self.hints.lock().unwrap().push(hint.map(str::to_string));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected transcribe call")
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn drain(results: &habla_queue::QueueReceiver<TranscriptUpdate>) -> Vec<TranscriptUpdate> {
    let mut updates = Vec::new();
    loop {
        match results.get() {
            StreamItem::Item(update) => updates.push(update),
            StreamItem::EndOfStream => return updates,
        }
    }
}

#[test]
fn settled_text_is_monotonic_across_cycles() {
    // Patience of 1 s over 500 ms chunks. The recognizer revises its trailing
    // words across cycles; only text older than the patience window settles.
    let engine = ScriptedEngine::new(vec![
        Ok(vec![seg("hola ", 0, 400)]),
        Ok(vec![seg("hola ", 0, 400), seg("mundo", 450, 900)]),
        Ok(vec![seg("hola ", 0, 400), seg("mundo ", 450, 1400)]),
        Ok(vec![seg("mundo ", 0, 950), seg("!", 950, 1500)]),
    ]);

    let (chunk_tx, chunk_rx) = queue();
    let (result_tx, result_rx) = queue();
    for i in 0..4 {
        chunk_tx.put(AudioChunk::new(i, vec![0.1; HALF_SECOND]));
    }
    chunk_tx.close();

    let worker = TranscriptionWorker::new(
        engine.clone(),
        PromptMemory::new(3, ""),
        1000,
        chunk_rx,
        result_tx,
        None,
    );
    worker.run().unwrap();

    let updates = drain(&result_rx);
    assert_eq!(updates.len(), 4);

    // Cycles 1-2: everything is inside the patience window.
    assert_eq!(updates[0].settled, "");
    assert_eq!(updates[0].tentative, "hola ");
    assert_eq!(updates[1].settled, "");

    // Cycle 3: "hola " falls out of the patience window and settles; the
    // straddling "mundo " stays whole on the tentative side.
    assert_eq!(updates[2].settled, "hola ");
    assert_eq!(updates[2].tentative, "mundo ");

    // Cycle 4: nothing new settles.
    assert_eq!(updates[3].settled, "");
    assert_eq!(updates[3].tentative, "mundo !");

    // Monotonic settlement: settled deltas concatenate into a prefix of the
    // final transcript and are never re-emitted as tentative.
    let full: String = updates.iter().map(|u| u.settled.as_str()).collect();
    assert_eq!(full, "hola ");
    assert!(!updates[3].tentative.contains("hola"));

    // The settled fragment became recognizer context on the next cycle.
    let hints = engine.hints();
    assert_eq!(hints[0], None);
    assert_eq!(hints[3].as_deref(), Some("hola "));
}

#[test]
fn sentinel_terminates_without_further_gets() {
    let engine = ScriptedEngine::new(vec![]);
    let (chunk_tx, chunk_rx) = queue::<AudioChunk>();
    let (result_tx, result_rx) = queue();
    chunk_tx.close();

    let worker = TranscriptionWorker::new(
        engine,
        PromptMemory::new(1, ""),
        5000,
        chunk_rx,
        result_tx,
        None,
    );
    worker.run().unwrap();

    assert!(result_rx.get().is_end());
}

#[test]
fn empty_recognizer_result_emits_empty_update() {
    let engine = ScriptedEngine::new(vec![Ok(vec![])]);
    let (chunk_tx, chunk_rx) = queue();
    let (result_tx, result_rx) = queue();
    chunk_tx.put(AudioChunk::new(0, vec![0.0; HALF_SECOND]));
    chunk_tx.close();

    let worker = TranscriptionWorker::new(
        engine,
        PromptMemory::new(1, ""),
        5000,
        chunk_rx,
        result_tx,
        None,
    );
    worker.run().unwrap();

    let updates = drain(&result_rx);
    assert_eq!(
        updates,
        vec![TranscriptUpdate {
            settled: String::new(),
            tentative: String::new(),
        }]
    );
}

#[test]
fn recognizer_failure_is_fatal_and_terminal() {
    let engine = ScriptedEngine::new(vec![
        Ok(vec![seg("hola", 0, 400)]),
        Err(SttError::TranscriptionFailed("model fault".into())),
    ]);
    let (chunk_tx, chunk_rx) = queue();
    let (result_tx, result_rx) = queue();
    chunk_tx.put(AudioChunk::new(0, vec![0.1; HALF_SECOND]));
    chunk_tx.put(AudioChunk::new(1, vec![0.1; HALF_SECOND]));

    let worker = TranscriptionWorker::new(
        engine,
        PromptMemory::new(1, ""),
        5000,
        chunk_rx,
        result_tx,
        None,
    );
    assert!(worker.run().is_err());

    // One update from the good cycle, then the terminal marker.
    assert!(matches!(result_rx.get(), StreamItem::Item(_)));
    assert!(result_rx.get().is_end());
}

#[test]
fn broadcast_receives_cumulative_transcript() {
    // Short patience so the first cycle settles outright.
    let engine = ScriptedEngine::new(vec![
        Ok(vec![seg("hola ", 0, 300)]),
        Ok(vec![seg("mundo", 0, 550)]),
    ]);
    let registry = ClientRegistry::new();
    let (_id, mut subscriber) = registry.register();

    let (chunk_tx, chunk_rx) = queue();
    let (result_tx, _result_rx) = queue();
    chunk_tx.put(AudioChunk::new(0, vec![0.1; HALF_SECOND]));
    chunk_tx.put(AudioChunk::new(1, vec![0.1; HALF_SECOND]));
    chunk_tx.close();

    let worker = TranscriptionWorker::new(
        engine,
        PromptMemory::new(3, ""),
        100,
        chunk_rx,
        result_tx,
        Some(registry),
    );
    worker.run().unwrap();

    let first: WireMessage = serde_json::from_str(&subscriber.try_recv().unwrap()).unwrap();
    match first {
        WireMessage::Transcript {
            full_text,
            settled_delta,
            tentative,
            ..
        } => {
            assert_eq!(full_text, "hola ");
            assert_eq!(settled_delta, "hola ");
            assert_eq!(tentative, "");
        }
        other => panic!("unexpected message: {other:?}"),
    }

    let second: WireMessage = serde_json::from_str(&subscriber.try_recv().unwrap()).unwrap();
    match second {
        WireMessage::Transcript {
            full_text,
            settled_delta,
            tentative,
            ..
        } => {
            assert_eq!(full_text, "hola ");
            assert_eq!(settled_delta, "");
            assert_eq!(tentative, "mundo");
        }
        other => panic!("unexpected message: {other:?}"),
    }
}
