//! Settled/tentative split for one recognition cycle.

use habla_stt::Segment;

/// Result of stabilizing one recognizer pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Stabilization {
    /// Text locked in this cycle; never re-emitted as tentative.
    pub settled_text: String,
    /// Text still subject to revision next cycle.
    pub tentative_text: String,
    /// Window offset (ms) before which audio is safe to discard. Zero means
    /// the window keeps everything this cycle.
    pub settle_point_ms: u64,
    /// Number of leading segments that settled.
    pub settled_segments: usize,
}

/// Split `segments` into settled and tentative halves.
///
/// The candidate threshold is `window_ms - patience_ms`: the recognizer's
/// trailing words lack acoustic context, so audio inside the patience
/// interval stays provisional for one more cycle. The first segment whose end
/// reaches the threshold starts the tentative side; a segment straddling the
/// threshold is kept whole on the tentative side, pulling the settle point
/// back to its start. Segment text is never split.
///
/// When no segment reaches the threshold every segment settles and the settle
/// point is the threshold itself. An empty segment list settles nothing and
/// leaves the window untouched.
pub fn stabilize(segments: &[Segment], window_ms: u64, patience_ms: u64) -> Stabilization {
    if segments.is_empty() {
        return Stabilization {
            settled_text: String::new(),
            tentative_text: String::new(),
            settle_point_ms: 0,
            settled_segments: 0,
        };
    }

    let threshold = window_ms.saturating_sub(patience_ms);
    let mut settle_point_ms = threshold;
    let mut split = segments.len();
    for (i, segment) in segments.iter().enumerate() {
        if segment.end_ms >= threshold {
            if segment.start_ms < threshold {
                settle_point_ms = segment.start_ms;
            }
            split = i;
            break;
        }
    }

    let settled_text: String = segments[..split].iter().map(|s| s.text.as_str()).collect();
    let tentative_text: String = segments[split..].iter().map(|s| s.text.as_str()).collect();

    Stabilization {
        settled_text,
        tentative_text,
        settle_point_ms,
        settled_segments: split,
    }
}
