use crate::models::UrlRecord;
use std::mem;
use std::num::NonZeroUsize;

/// The sitemaps.org limit on `<url>` entries per file.
pub const MAX_URLSET_SIZE: usize = 50_000;

/// A numbered run of records, ready to be flushed.
#[derive(Debug, PartialEq)]
pub struct Batch {
    /// Starts at 1 and increases by one per batch of the group.
    pub number: u64,
    pub records: Vec<UrlRecord>,
}

/// Rollover state machine for a batch group.
///
/// Owns the buffer and the batch counter; it does no I/O, so deciding *when*
/// to flush is kept apart from flushing.
#[derive(Debug)]
pub struct Accumulator {
    capacity: NonZeroUsize,
    buffer: Vec<UrlRecord>,
    next: u64,
}
impl Accumulator {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            buffer: Vec::new(),
            next: 1,
        }
    }

    /// Buffer a record. Returns the full batch exactly when the buffer reaches
    /// capacity; the buffer is empty again afterwards.
    pub fn push(&mut self, record: UrlRecord) -> Option<Batch> {
        self.buffer.push(record);
        (self.buffer.len() >= self.capacity.get()).then(|| self.take())
    }

    /// Drain whatever is buffered, even nothing, as the final batch.
    pub fn finish(mut self) -> Batch {
        self.take()
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn take(&mut self) -> Batch {
        let number = self.next;
        self.next += 1;
        let records = mem::replace(&mut self.buffer, Vec::with_capacity(self.capacity.get().min(1024)));
        Batch { number, records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(n: usize) -> UrlRecord {
        UrlRecord::new(format!("/{n}"))
    }

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[rstest]
    #[case(7, 3, vec![3, 3], 1)]
    #[case(6, 3, vec![3, 3], 0)]
    #[case(0, 3, vec![], 0)]
    #[case(5, 1, vec![1, 1, 1, 1, 1], 0)]
    #[case(2, 50_000, vec![], 2)]
    fn test_rollover_sizes(
        #[case] total: usize,
        #[case] cap: usize,
        #[case] full: Vec<usize>,
        #[case] remainder: usize,
    ) {
        let mut accumulator = Accumulator::new(capacity(cap));
        let batches: Vec<_> = (0..total).filter_map(|n| accumulator.push(record(n))).collect();
        assert_eq!(batches.iter().map(|b| b.records.len()).collect::<Vec<_>>(), full);
        let last = accumulator.finish();
        assert_eq!(last.records.len(), remainder);
        assert_eq!(last.number, full.len() as u64 + 1);
    }

    #[test]
    fn test_batches_keep_insertion_order() {
        let mut accumulator = Accumulator::new(capacity(3));
        let mut batches: Vec<_> = ["a", "b", "c", "d", "e", "f", "g"]
            .into_iter()
            .filter_map(|path| accumulator.push(UrlRecord::new(format!("/{path}"))))
            .collect();
        batches.push(accumulator.finish());

        let locations: Vec<Vec<&str>> =
            batches.iter().map(|b| b.records.iter().map(UrlRecord::location).collect()).collect();
        assert_eq!(locations, vec![vec!["/a", "/b", "/c"], vec!["/d", "/e", "/f"], vec!["/g"]]);
        assert_eq!(batches.iter().map(|b| b.number).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_buffer_resets_after_rollover() {
        let mut accumulator = Accumulator::new(capacity(2));
        assert!(accumulator.push(record(1)).is_none());
        assert_eq!(accumulator.buffered(), 1);
        assert!(accumulator.push(record(2)).is_some());
        assert_eq!(accumulator.buffered(), 0);
    }
}
