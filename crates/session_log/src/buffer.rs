use crate::schema::Sample;

/// Pending samples are flushed once more than this many are queued.
pub const FLUSH_THRESHOLD: usize = 10;

/// In-memory queue of samples waiting to be serialized.
#[derive(Debug, Clone)]
pub struct RecordBuffer {
    records: Vec<Sample>,
    threshold: usize,
}

impl Default for RecordBuffer {
    fn default() -> Self {
        Self::with_threshold(FLUSH_THRESHOLD)
    }
}

impl RecordBuffer {
    #[must_use]
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            records: Vec::with_capacity(threshold + 1),
            threshold,
        }
    }

    /// Queues `sample`; returns `true` when the buffer now exceeds its threshold.
    pub fn push(&mut self, sample: Sample) -> bool {
        self.records.push(sample);
        self.records.len() > self.threshold
    }

    /// Takes every pending sample in insertion order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Sample> {
        self.records.drain(..)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: i64) -> Sample {
        Sample::new().with("n", n)
    }

    #[test]
    fn push_signals_only_after_threshold_is_exceeded() {
        let mut buffer = RecordBuffer::default();
        for n in 0..FLUSH_THRESHOLD as i64 {
            assert!(!buffer.push(sample(n)), "sample {n} should not trigger a flush");
        }
        assert!(buffer.push(sample(99)));
        assert_eq!(buffer.len(), FLUSH_THRESHOLD + 1);
    }

    #[test]
    fn drain_preserves_insertion_order_and_empties() {
        let mut buffer = RecordBuffer::with_threshold(3);
        buffer.push(sample(1));
        buffer.push(sample(2));

        let drained = buffer.drain().collect::<Vec<_>>();
        assert_eq!(drained, vec![sample(1), sample(2)]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn clear_discards_pending_samples() {
        let mut buffer = RecordBuffer::default();
        buffer.push(sample(1));
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
