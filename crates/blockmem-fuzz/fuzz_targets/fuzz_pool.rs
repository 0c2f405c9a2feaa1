#![no_main]
use blockmem_core::{BlockAddr, BlockPool, required_buffer_len};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parse data as a sequence of alloc/free/realloc operations.
    if data.len() < 4 {
        return;
    }

    const BLOCK_SIZE: usize = 32;
    const BLOCK_COUNT: usize = 256;

    let buffer = vec![0u8; required_buffer_len(BLOCK_SIZE, BLOCK_COUNT)];
    let Ok(mut pool) = BlockPool::create(buffer, BLOCK_SIZE, BLOCK_COUNT) else {
        return;
    };
    let mut live: Vec<BlockAddr> = Vec::new();

    for chunk in data.chunks(4) {
        if chunk.len() < 4 {
            break;
        }
        let op = chunk[0] % 4;
        let size = u16::from_le_bytes([chunk[1], chunk[2]]) as usize;

        match op {
            0 => {
                if let Ok(addr) = pool.alloc(size % (BLOCK_SIZE * BLOCK_COUNT)) {
                    live.push(addr);
                }
            }
            1 => {
                if let Some(addr) = live.pop() {
                    pool.free(addr);
                }
            }
            2 => {
                if let Some(addr) = live.pop() {
                    if let Ok(new_addr) = pool.realloc(addr, size % (BLOCK_SIZE * 16)) {
                        live.push(new_addr);
                    } else {
                        live.push(addr);
                    }
                }
            }
            _ => {
                // Hostile address: must be a no-op or a clean error.
                let addr = BlockAddr::new(size.wrapping_mul(usize::from(chunk[3])));
                let _ = pool.heap_size_of(addr);
                pool.free(addr);
            }
        }
    }

    // Clean up; the pool must drain back to fully free.
    for addr in live.drain(..) {
        pool.free(addr);
    }
    assert_eq!(pool.free_size(), BLOCK_SIZE * BLOCK_COUNT);
});
