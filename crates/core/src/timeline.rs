//! Segment timeline algorithms.
//!
//! Pure functions over ordered `(start_ms, end_ms, text)` spans: active
//! segment lookup for playback, per-segment progress, advisory timing
//! validation and conservative merging of duplicate recognizer output.
//! Anything that carries timing and text can participate by implementing
//! [`TimedText`].

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest silence between consecutive segments before it is reported.
pub const DEFAULT_GAP_THRESHOLD_MS: i64 = 500;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A time-bounded piece of text.
pub trait TimedText {
    fn start_ms(&self) -> i64;
    fn end_ms(&self) -> i64;
    fn text(&self) -> &str;
}

/// Owned span value used by the transcription pipeline before rows exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSpan {
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
}

impl SegmentSpan {
    pub fn new(start_ms: i64, end_ms: i64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

impl TimedText for SegmentSpan {
    fn start_ms(&self) -> i64 {
        self.start_ms
    }

    fn end_ms(&self) -> i64 {
        self.end_ms
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// A single timing problem between two neighbouring segments.
///
/// Indices are positions in the list sorted by `start_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimingIssue {
    Overlap {
        index: usize,
        next_index: usize,
        end_ms: i64,
        next_start_ms: i64,
    },
    Gap {
        index: usize,
        next_index: usize,
        end_ms: i64,
        next_start_ms: i64,
        threshold_ms: i64,
    },
}

impl fmt::Display for TimingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Overlap {
                index,
                next_index,
                end_ms,
                next_start_ms,
            } => write!(
                f,
                "Overlap between segments {index} and {next_index}: segment {index} ends at \
                 {end_ms}ms but segment {next_index} starts at {next_start_ms}ms"
            ),
            Self::Gap {
                index,
                next_index,
                end_ms,
                next_start_ms,
                threshold_ms,
            } => write!(
                f,
                "Gap of {}ms between segments {index} and {next_index} (threshold {threshold_ms}ms)",
                next_start_ms - end_ms
            ),
        }
    }
}

/// Result of [`validate_timing`]. Advisory: callers decide whether to block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingReport {
    pub valid: bool,
    pub issues: Vec<TimingIssue>,
}

impl TimingReport {
    /// Human-readable messages, one per issue.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    pub fn overlap_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| matches!(i, TimingIssue::Overlap { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Return the first segment containing `t_ms` (inclusive on both ends).
///
/// Input order breaks ties when segments overlap.
pub fn find_active_segment<T: TimedText>(segments: &[T], t_ms: i64) -> Option<&T> {
    segments
        .iter()
        .find(|s| s.start_ms() <= t_ms && t_ms <= s.end_ms())
}

/// Playback progress through `segment` at `t_ms`, clamped to `[0, 1]`.
pub fn segment_progress<T: TimedText>(segment: &T, t_ms: i64) -> f64 {
    let (start, end) = (segment.start_ms(), segment.end_ms());
    if t_ms < start {
        return 0.0;
    }
    if t_ms > end {
        return 1.0;
    }
    let duration = end - start;
    if duration <= 0 {
        return 1.0;
    }
    ((t_ms - start) as f64 / duration as f64).clamp(0.0, 1.0)
}

/// `(earliest start, latest end)` of a segment set, `None` when empty.
pub fn timeline_span<T: TimedText>(segments: &[T]) -> Option<(i64, i64)> {
    let start = segments.iter().map(TimedText::start_ms).min()?;
    let end = segments.iter().map(TimedText::end_ms).max()?;
    Some((start, end))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check a segment set for overlaps and for gaps longer than
/// `gap_threshold_ms`.
///
/// Works on a copy sorted by `start_ms`; the input is left untouched.
pub fn validate_timing<T: TimedText>(segments: &[T], gap_threshold_ms: i64) -> TimingReport {
    let mut sorted: Vec<&T> = segments.iter().collect();
    sorted.sort_by_key(|s| s.start_ms());

    let mut issues = Vec::new();
    for (index, pair) in sorted.windows(2).enumerate() {
        let (current, next) = (pair[0], pair[1]);
        let next_index = index + 1;

        if current.end_ms() > next.start_ms() {
            issues.push(TimingIssue::Overlap {
                index,
                next_index,
                end_ms: current.end_ms(),
                next_start_ms: next.start_ms(),
            });
        } else if next.start_ms() - current.end_ms() > gap_threshold_ms {
            issues.push(TimingIssue::Gap {
                index,
                next_index,
                end_ms: current.end_ms(),
                next_start_ms: next.start_ms(),
                threshold_ms: gap_threshold_ms,
            });
        }
    }

    TimingReport {
        valid: issues.is_empty(),
        issues,
    }
}

// ---------------------------------------------------------------------------
// Ordering and merging
// ---------------------------------------------------------------------------

/// Stable chronological sort by `start_ms`, then `end_ms`.
///
/// The position after sorting is the dense `segment_index` a bulk replace
/// assigns.
pub fn sort_chronologically<T: TimedText>(segments: &mut [T]) {
    segments.sort_by_key(|s| (s.start_ms(), s.end_ms()));
}

/// Sort `segments` chronologically and pair each with its dense 0-based
/// `segment_index`.
pub fn order_for_replace<T: TimedText>(mut segments: Vec<T>) -> Vec<(i32, T)> {
    sort_chronologically(&mut segments);
    segments
        .into_iter()
        .enumerate()
        .map(|(index, segment)| (index as i32, segment))
        .collect()
}

/// Collapse recognizer artifacts where one utterance was split into
/// duplicate-text micro-segments.
///
/// A segment is folded into the previous one only when the text is
/// byte-identical and it starts exactly where the previous one ends.
/// Applying this twice gives the same result as applying it once.
pub fn merge_adjacent_segments(segments: &[SegmentSpan]) -> Vec<SegmentSpan> {
    let mut merged: Vec<SegmentSpan> = Vec::with_capacity(segments.len());

    for segment in segments {
        match merged.last_mut() {
            Some(previous)
                if previous.text == segment.text && segment.start_ms == previous.end_ms =>
            {
                previous.end_ms = segment.end_ms;
            }
            _ => merged.push(segment.clone()),
        }
    }

    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
