//! Per-run-length hint cache.
//!
//! The cache remembers at most one candidate free-run start per run-length
//! class, populated at pool creation and opportunistically while scanning.
//! Entries are one-shot (consumed on use, never re-queued) and purely
//! advisory: the pool re-verifies a hinted run against the table before
//! committing to it, so a stale entry costs a scan but never correctness.

/// Number of run-length classes the cache tracks.
pub const HINT_CLASSES: usize = 16;

/// Fixed-size cache of candidate free-run start indexes.
#[derive(Debug, Clone)]
pub struct HintCache {
    /// One optional block index per run-length class; `None` = unassigned.
    classes: [Option<u32>; HINT_CLASSES],
}

impl HintCache {
    /// Creates a cache pre-seeded with the bootstrap staircase
    /// `h[0] = 0, h[1] = 1, h[k] = k + h[k-1] - 1`.
    ///
    /// The staircase assumes a fully empty pool, laying the first few
    /// differently-sized requests end to end. It is not validated against
    /// occupancy here; consumers must verify before use.
    #[must_use]
    pub fn seeded() -> Self {
        let mut classes = [None; HINT_CLASSES];
        classes[0] = Some(0);
        classes[1] = Some(1);
        for class in 2..HINT_CLASSES {
            let prev = classes[class - 1].unwrap_or(0);
            classes[class] = Some(class as u32 + prev - 1);
        }
        Self { classes }
    }

    /// Consumes the hint for `class`, leaving the slot unassigned.
    pub fn take(&mut self, class: usize) -> Option<u32> {
        if class >= HINT_CLASSES {
            return None;
        }
        self.classes[class].take()
    }

    /// Records `start` as the candidate run for `run_length` blocks,
    /// overwriting any previous entry. Runs of 16 or more blocks are not
    /// tracked.
    pub fn publish(&mut self, run_length: usize, start: u32) {
        if run_length < HINT_CLASSES {
            self.classes[run_length] = Some(start);
        }
    }

    /// Preferred starting index for a table scan: the class-0 hint, without
    /// consuming it, or 0 when unassigned.
    #[must_use]
    pub fn scan_start(&self) -> u32 {
        self.classes[0].unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_staircase() {
        let cache = HintCache::seeded();
        let expected = [0, 1, 2, 4, 7, 11, 16, 22, 29, 37, 46, 56, 67, 79, 92, 106];
        for (class, &start) in expected.iter().enumerate() {
            assert_eq!(cache.classes[class], Some(start), "class {class}");
        }
    }

    #[test]
    fn test_take_is_one_shot() {
        let mut cache = HintCache::seeded();
        assert_eq!(cache.take(2), Some(2));
        assert_eq!(cache.take(2), None);
    }

    #[test]
    fn test_publish_overwrites() {
        let mut cache = HintCache::seeded();
        cache.publish(3, 40);
        cache.publish(3, 90);
        assert_eq!(cache.take(3), Some(90));
    }

    #[test]
    fn test_long_runs_not_tracked() {
        let mut cache = HintCache::seeded();
        cache.publish(HINT_CLASSES, 7);
        cache.publish(200, 7);
        assert_eq!(cache.take(HINT_CLASSES), None);
        assert_eq!(cache.take(200), None);
    }

    #[test]
    fn test_scan_start_does_not_consume() {
        let mut cache = HintCache::seeded();
        cache.publish(0, 5);
        assert_eq!(cache.scan_start(), 5);
        assert_eq!(cache.scan_start(), 5);
        assert_eq!(cache.take(0), Some(5));
        // Consumed class-0 hint falls back to index 0.
        assert_eq!(cache.scan_start(), 0);
    }
}
