//! Shuffle history tracking
//!
//! Records the indices left behind by shuffle jumps so "previous" can
//! retrace them exactly.

/// Last-in-first-out record of indices visited in shuffle mode
///
/// Unbounded: it grows by one entry per shuffle jump and is only emptied
/// when shuffle is switched off, a track is selected explicitly, or the
/// sequencer advances without shuffle. Its size is bounded by the length
/// of the listening session.
#[derive(Debug, Clone, Default)]
pub struct ShuffleHistory {
    /// Index stack (most recent = back)
    indices: Vec<usize>,
}

impl ShuffleHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the index being left by a shuffle jump
    pub fn push(&mut self, index: usize) {
        self.indices.push(index);
    }

    /// Most recent index (without removing)
    pub fn peek(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    /// Pop the most recent index for "previous"
    pub fn pop(&mut self) -> Option<usize> {
        self.indices.pop()
    }

    /// Recorded indices, oldest first
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    /// Number of recorded jumps
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.indices.clear();
    }
}
