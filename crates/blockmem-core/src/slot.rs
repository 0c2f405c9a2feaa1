//! Slot-table records and allocation ids.
//!
//! Each block in the pool has a 4-byte little-endian record in the table
//! region that precedes block storage. The low 24 bits hold the ownership
//! tag (0 means the block is free), the high 8 bits hold the run length,
//! which is meaningful on the first slot of a run only. A slot is free iff
//! the whole record is zero, so interior slots of a multi-block run (tag
//! set, length zero) always read as occupied.

/// Size of one slot record in the table region (bytes).
pub const SLOT_RECORD_SIZE: usize = 4;

/// Ownership tag reserved for free slots. Never assigned to a live run.
pub const FREE_TAG: u32 = 0;

/// Exclusive ceiling for allocation ids (the tag field is 24 bits wide).
/// The counter wraps back to 1 here, skipping the free sentinel.
pub const MAX_ALLOCATION_ID: u32 = 0x0100_0000;

/// Longest run the 8-bit length field can describe.
pub const MAX_RUN_BLOCKS: usize = 0xFF;

/// Decoded view of one slot record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRecord {
    /// Ownership tag of the run this block belongs to (0 = free).
    pub tag: u32,
    /// Run length in blocks; meaningful on the first slot of a run only.
    pub run_length: u8,
}

impl SlotRecord {
    /// The all-zero record marking a free block.
    pub const FREE: SlotRecord = SlotRecord {
        tag: FREE_TAG,
        run_length: 0,
    };

    /// Packs the record into its 4-byte wire form.
    #[must_use]
    pub fn encode(self) -> u32 {
        (self.tag & (MAX_ALLOCATION_ID - 1)) | (u32::from(self.run_length) << 24)
    }

    /// Unpacks a record from its 4-byte wire form.
    #[must_use]
    pub fn decode(raw: u32) -> Self {
        SlotRecord {
            tag: raw & (MAX_ALLOCATION_ID - 1),
            run_length: (raw >> 24) as u8,
        }
    }

    /// A slot is free iff both tag and length are zero simultaneously.
    #[must_use]
    pub fn is_free(self) -> bool {
        self.encode() == 0
    }
}

/// Reads the record for `index` out of the table region.
#[must_use]
pub fn read_slot(table: &[u8], index: usize) -> SlotRecord {
    let at = index * SLOT_RECORD_SIZE;
    let raw = u32::from_le_bytes([table[at], table[at + 1], table[at + 2], table[at + 3]]);
    SlotRecord::decode(raw)
}

/// Writes the record for `index` into the table region.
pub fn write_slot(table: &mut [u8], index: usize, record: SlotRecord) {
    let at = index * SLOT_RECORD_SIZE;
    table[at..at + SLOT_RECORD_SIZE].copy_from_slice(&record.encode().to_le_bytes());
}

/// Wrapping allocation-id counter.
///
/// Ids give each live run a short distinct tag for diagnostics; they are
/// never used for lookup. After `MAX_ALLOCATION_ID - 1` the counter wraps
/// to 1, so collision with a very long-lived run is possible and accepted.
#[derive(Debug, Clone)]
pub struct AllocationIds {
    next: u32,
}

impl AllocationIds {
    /// Starts the counter at 1; 0 is the free sentinel.
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Hands out the next id and advances the counter.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        if self.next == MAX_ALLOCATION_ID {
            self.next = 1;
        }
        id
    }
}

impl Default for AllocationIds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let rec = SlotRecord {
            tag: 0x00AB_CDEF,
            run_length: 7,
        };
        assert_eq!(SlotRecord::decode(rec.encode()), rec);
    }

    #[test]
    fn test_free_is_all_zero() {
        assert_eq!(SlotRecord::FREE.encode(), 0);
        assert!(SlotRecord::FREE.is_free());
    }

    #[test]
    fn test_interior_slot_reads_occupied() {
        // Interior slots of a multi-block run keep length 0 but carry a tag.
        let interior = SlotRecord {
            tag: 42,
            run_length: 0,
        };
        assert!(!interior.is_free());
    }

    #[test]
    fn test_tag_masked_to_24_bits() {
        let rec = SlotRecord {
            tag: 0xFFFF_FFFF,
            run_length: 0,
        };
        assert_eq!(SlotRecord::decode(rec.encode()).tag, MAX_ALLOCATION_ID - 1);
    }

    #[test]
    fn test_table_read_write() {
        let mut table = vec![0u8; 4 * SLOT_RECORD_SIZE];
        let rec = SlotRecord {
            tag: 3,
            run_length: 2,
        };
        write_slot(&mut table, 2, rec);
        assert_eq!(read_slot(&table, 2), rec);
        assert!(read_slot(&table, 1).is_free());
        assert!(read_slot(&table, 3).is_free());

        write_slot(&mut table, 2, SlotRecord::FREE);
        assert!(read_slot(&table, 2).is_free());
    }

    #[test]
    fn test_ids_start_at_one() {
        let mut ids = AllocationIds::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
    }

    #[test]
    fn test_ids_wrap_skipping_zero() {
        let mut ids = AllocationIds {
            next: MAX_ALLOCATION_ID - 1,
        };
        assert_eq!(ids.next_id(), MAX_ALLOCATION_ID - 1);
        assert_eq!(ids.next_id(), 1);
    }
}
