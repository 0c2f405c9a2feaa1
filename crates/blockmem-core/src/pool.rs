//! Fixed-block pool over a caller-supplied buffer.
//!
//! The buffer is split into a slot table (one 4-byte record per block)
//! followed immediately by block storage. Allocation hands out runs of
//! contiguous free blocks found either through the hint cache or a circular
//! table scan; deallocation zeroes the run's records and publishes its
//! start back into the cache. The pool performs no dynamic allocation of
//! its own and never grows the buffer.

use crate::error::PoolError;
use crate::hint::{HINT_CLASSES, HintCache};
use crate::slot::{self, AllocationIds, MAX_RUN_BLOCKS, SLOT_RECORD_SIZE, SlotRecord};

/// Address of an allocation inside a pool's storage region.
///
/// A plain byte offset from the start of block storage. Addresses returned
/// by [`BlockPool::alloc`] are always block-aligned; arbitrary offsets can
/// be constructed for the pointer-style API, and resolve to the block that
/// contains them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockAddr(usize);

impl BlockAddr {
    /// Wraps a byte offset into the storage region.
    #[must_use]
    pub fn new(offset: usize) -> Self {
        BlockAddr(offset)
    }

    /// Byte offset from the start of the storage region.
    #[must_use]
    pub fn offset(self) -> usize {
        self.0
    }
}

/// Minimum buffer length for a pool of `block_count` blocks of
/// `block_size` bytes: storage plus one slot record per block.
#[must_use]
pub const fn required_buffer_len(block_size: usize, block_count: usize) -> usize {
    block_count * (block_size + SLOT_RECORD_SIZE)
}

/// Fixed-block allocator state over one caller-supplied buffer.
///
/// All operations take `&mut self`; the pool holds no internal
/// synchronization and callers serialize access externally.
#[derive(Debug)]
pub struct BlockPool {
    /// Caller-supplied backing storage: slot table, then block storage.
    buffer: Vec<u8>,
    block_size: usize,
    block_count: usize,
    /// Byte offset of the storage region in `buffer` (= table length).
    storage_base: usize,
    /// Aggregate count of currently-free blocks. Kept exactly consistent
    /// on every alloc/free; the cheap admission check depends on it.
    free_blocks: usize,
    hints: HintCache,
    ids: AllocationIds,
}

impl BlockPool {
    /// Initializes a pool over `buffer`, which must be at least
    /// [`required_buffer_len`] bytes long.
    ///
    /// Marks every block free, seeds the hint cache, and starts the
    /// allocation-id counter at 1.
    pub fn create(
        mut buffer: Vec<u8>,
        block_size: usize,
        block_count: usize,
    ) -> Result<Self, PoolError> {
        if block_size == 0 || block_count == 0 || block_count > u32::MAX as usize {
            return Err(PoolError::BadGeometry);
        }
        let needed = block_size
            .checked_add(SLOT_RECORD_SIZE)
            .and_then(|per_block| per_block.checked_mul(block_count))
            .ok_or(PoolError::BadGeometry)?;
        if buffer.len() < needed {
            return Err(PoolError::BufferTooSmall {
                needed,
                got: buffer.len(),
            });
        }

        let storage_base = block_count * SLOT_RECORD_SIZE;
        buffer[..storage_base].fill(0);

        Ok(Self {
            buffer,
            block_size,
            block_count,
            storage_base,
            free_blocks: block_count,
            hints: HintCache::seeded(),
            ids: AllocationIds::new(),
        })
    }

    /// Allocates a run of at least `ceil(size / block_size)` blocks
    /// (minimum one block, even for `size == 0`).
    ///
    /// Consults the hint cache first; a hinted run is re-verified against
    /// the table and the scan is the fallback. Fails with
    /// [`PoolError::OutOfMemory`] when no long-enough contiguous run
    /// exists, leaving the table and counters untouched.
    pub fn alloc(&mut self, size: usize) -> Result<BlockAddr, PoolError> {
        let blocks = self.blocks_for(size);
        if blocks > self.free_blocks || blocks > MAX_RUN_BLOCKS {
            return Err(PoolError::OutOfMemory);
        }

        let hinted = if blocks == 1 {
            self.hints.take(0).or_else(|| self.hints.take(1))
        } else if blocks < HINT_CLASSES {
            self.hints.take(blocks)
        } else {
            None
        };

        // Hints are advisory. Taken entries are gone either way (one-shot);
        // only a verified run skips the scan.
        let start = match hinted {
            Some(h) if self.run_is_free(h as usize, blocks) => h as usize,
            _ => self
                .scan_for_run(blocks)
                .ok_or(PoolError::OutOfMemory)?,
        };

        self.commit_run(start, blocks);
        Ok(BlockAddr(start * self.block_size))
    }

    /// Returns all blocks of the run at `addr` to the free pool.
    ///
    /// No-op unless `addr` resolves to an in-range block whose slot is a
    /// live run head. The run's start is published to the hint cache
    /// before its records are zeroed.
    pub fn free(&mut self, addr: BlockAddr) {
        let Some(index) = self.index_of(addr) else {
            return;
        };
        let Some(blocks) = self.run_at(index) else {
            return;
        };

        self.hints.publish(blocks, index as u32);
        let table = self.table_mut();
        for i in 0..blocks {
            slot::write_slot(table, index + i, SlotRecord::FREE);
        }
        self.free_blocks += blocks;
    }

    /// Resizes the allocation at `addr`, relocating it (this pool never
    /// resizes in place) and preserving `min(old_bytes, new_size)` bytes.
    ///
    /// On [`PoolError::OutOfMemory`] the original allocation is untouched.
    pub fn realloc(&mut self, addr: BlockAddr, new_size: usize) -> Result<BlockAddr, PoolError> {
        let old_index = self.index_of(addr).ok_or(PoolError::InvalidAddress)?;
        let old_blocks = self.run_at(old_index).ok_or(PoolError::InvalidAddress)?;
        let old_bytes = old_blocks * self.block_size;
        let new_addr = self.alloc(new_size)?;

        let copy_len = old_bytes.min(new_size);
        if copy_len > 0 {
            // Copy from the resolved run start, not the raw offset: `addr`
            // may point into the middle of the run's first block.
            let src = self.storage_base + old_index * self.block_size;
            let dst = self.storage_base + new_addr.offset();
            self.buffer.copy_within(src..src + copy_len, dst);
        }

        self.free(addr);
        Ok(new_addr)
    }

    /// Total bytes currently free. Exact, since all blocks are equal-sized.
    #[must_use]
    pub fn free_size(&self) -> usize {
        self.free_blocks * self.block_size
    }

    /// Byte length of the run at `addr` (`run_length * block_size`).
    ///
    /// Fails with [`PoolError::InvalidAddress`] unless `addr` resolves to
    /// a live run head.
    pub fn heap_size_of(&self, addr: BlockAddr) -> Result<usize, PoolError> {
        let index = self.index_of(addr).ok_or(PoolError::InvalidAddress)?;
        let blocks = self.run_at(index).ok_or(PoolError::InvalidAddress)?;
        Ok(blocks * self.block_size)
    }

    /// Read access to the first `len` bytes of the run at `addr`.
    ///
    /// `addr` resolves to its containing block like every other operation,
    /// so the window always starts at the owning run's first byte.
    pub fn data(&self, addr: BlockAddr, len: usize) -> Result<&[u8], PoolError> {
        let (base, run_bytes) = self.run_bounds(addr)?;
        if len > run_bytes {
            return Err(PoolError::InvalidAddress);
        }
        Ok(&self.buffer[base..base + len])
    }

    /// Write access to the first `len` bytes of the run at `addr`.
    pub fn data_mut(&mut self, addr: BlockAddr, len: usize) -> Result<&mut [u8], PoolError> {
        let (base, run_bytes) = self.run_bounds(addr)?;
        if len > run_bytes {
            return Err(PoolError::InvalidAddress);
        }
        Ok(&mut self.buffer[base..base + len])
    }

    /// Size of one block in bytes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks managed by the pool.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Total storage capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.block_size * self.block_count
    }

    /// Hands the backing buffer back to the caller, consuming the pool.
    #[must_use]
    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    /// Blocks needed to hold `size` bytes, minimum one.
    fn blocks_for(&self, size: usize) -> usize {
        if size == 0 {
            1
        } else {
            size.div_ceil(self.block_size)
        }
    }

    /// Resolves an address to the index of the block containing it.
    fn index_of(&self, addr: BlockAddr) -> Option<usize> {
        let index = addr.offset() / self.block_size;
        (index < self.block_count).then_some(index)
    }

    /// Buffer base and byte length of the run owning `addr`.
    ///
    /// Derived from the resolved block index, never from the raw offset,
    /// so a mid-block address cannot shift the window past the run.
    fn run_bounds(&self, addr: BlockAddr) -> Result<(usize, usize), PoolError> {
        let index = self.index_of(addr).ok_or(PoolError::InvalidAddress)?;
        let blocks = self.run_at(index).ok_or(PoolError::InvalidAddress)?;
        Ok((
            self.storage_base + index * self.block_size,
            blocks * self.block_size,
        ))
    }

    /// Run length at `index` if its slot is a live run head.
    fn run_at(&self, index: usize) -> Option<usize> {
        let record = self.slot(index);
        if record.is_free() || record.run_length == 0 {
            return None;
        }
        Some(record.run_length as usize)
    }

    fn slot(&self, index: usize) -> SlotRecord {
        slot::read_slot(&self.buffer[..self.storage_base], index)
    }

    fn table_mut(&mut self) -> &mut [u8] {
        let end = self.storage_base;
        &mut self.buffer[..end]
    }

    /// True if `start..start + blocks` lies in range and is entirely free.
    fn run_is_free(&self, start: usize, blocks: usize) -> bool {
        match start.checked_add(blocks) {
            Some(end) if end <= self.block_count => {
                (start..end).all(|index| self.slot(index).is_free())
            }
            _ => false,
        }
    }

    /// Circular scan for a run of `want` free blocks.
    ///
    /// Starts at the class-0 hint position, inspects each block at most
    /// once, and resets the candidate run at the index-0 wrap so a
    /// returned run is always a simple contiguous range. Short runs that
    /// end at an occupied slot are published to the hint cache in passing,
    /// last-discovered-wins.
    fn scan_for_run(&mut self, want: usize) -> Option<usize> {
        let count = self.block_count;
        let start = self.hints.scan_start() as usize % count;
        let mut run_start = 0;
        let mut run_len = 0;

        for step in 0..count {
            let index = (start + step) % count;
            if index == 0 && run_len != 0 {
                // Runs never span the wrap point of the index space.
                run_len = 0;
            }
            if self.slot(index).is_free() {
                if run_len == 0 {
                    run_start = index;
                }
                run_len += 1;
                if run_len == want {
                    return Some(run_start);
                }
            } else {
                if run_len != 0 {
                    self.hints.publish(run_len, run_start as u32);
                }
                run_len = 0;
            }
        }
        None
    }

    /// Tags every block of the run, records the length on the first slot,
    /// and updates the free-block counter.
    fn commit_run(&mut self, start: usize, blocks: usize) {
        let id = self.ids.next_id();
        let table = self.table_mut();
        for i in 0..blocks {
            slot::write_slot(
                table,
                start + i,
                SlotRecord {
                    tag: id,
                    run_length: 0,
                },
            );
        }
        slot::write_slot(
            table,
            start,
            SlotRecord {
                tag: id,
                run_length: blocks as u8,
            },
        );
        self.free_blocks -= blocks;
    }
}
