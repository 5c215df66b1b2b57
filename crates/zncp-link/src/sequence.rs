use std::sync::atomic::{AtomicU64, Ordering};

/// Shared allocator for frame sequence numbers.
///
/// All handlers draw from one counter so every in-flight command carries a
/// distinct sequence and responses can be matched back unambiguously.
/// Values cycle through 0..=254; 0xFF is never produced because some firmware
/// revisions reserve it. The first allocated value is 1.
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    counter: AtomicU64,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        SequenceAllocator::default()
    }

    /// Allocator whose next value is `(start + 1) % 255`. Used by tests that
    /// need predictable sequences.
    pub fn starting_at(start: u64) -> Self {
        SequenceAllocator {
            counter: AtomicU64::new(start),
        }
    }

    pub fn next(&self) -> u8 {
        ((self.counter.fetch_add(1, Ordering::Relaxed) + 1) % 255) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_start_at_one() {
        let sequences = SequenceAllocator::new();
        assert_eq!(sequences.next(), 1);
        assert_eq!(sequences.next(), 2);
    }

    #[test]
    fn test_sequences_wrap_before_reserved_value() {
        let sequences = SequenceAllocator::starting_at(253);
        assert_eq!(sequences.next(), 254);
        assert_eq!(sequences.next(), 0);
        assert_eq!(sequences.next(), 1);
    }

    #[test]
    fn test_sequences_never_yield_0xff() {
        let sequences = SequenceAllocator::new();
        for _ in 0..600 {
            assert_ne!(sequences.next(), 0xFF);
        }
    }
}
