//! Bounded rolling context hint for the recognizer.

use std::collections::VecDeque;

/// FIFO of the most recent settled text fragments, concatenated into the
/// recognizer's context hint.
///
/// Keeps the acoustic model's context recent and bounded in length, trading
/// long-range coherence for stable latency per call. The seed prompt is an
/// ordinary entry and is evicted like any other once capacity is exceeded.
#[derive(Debug, Clone)]
pub struct PromptMemory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl PromptMemory {
    /// `capacity` must be >= 1; enforced upstream by config validation.
    pub fn new(capacity: usize, seed: impl Into<String>) -> Self {
        let mut entries = VecDeque::with_capacity(capacity);
        entries.push_back(seed.into());
        Self { entries, capacity }
    }

    /// Append one settled fragment, evicting the oldest beyond capacity.
    pub fn push(&mut self, fragment: impl Into<String>) {
        self.entries.push_back(fragment.into());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Current hint: entries concatenated oldest-first.
    pub fn hint(&self) -> String {
        self.entries.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_with_initial_prompt() {
        let memory = PromptMemory::new(3, "contexto");
        assert_eq!(memory.hint(), "contexto");
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut memory = PromptMemory::new(2, "a");
        for fragment in ["b", "c", "d", "e"] {
            memory.push(fragment);
            assert!(memory.len() <= 2);
        }
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut memory = PromptMemory::new(3, "uno ");
        memory.push("dos ");
        memory.push("tres ");
        assert_eq!(memory.hint(), "uno dos tres ");

        memory.push("cuatro");
        assert_eq!(memory.hint(), "dos tres cuatro");
    }

    #[test]
    fn test_capacity_one_keeps_latest_only() {
        let mut memory = PromptMemory::new(1, "seed");
        memory.push("latest");
        assert_eq!(memory.hint(), "latest");
    }
}
