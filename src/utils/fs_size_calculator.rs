//! This module contains functions to calculate the geometry of the filesystem

use crate::fs::{BLOCK_SIZE, DIRECT_BLOCKS, MAX_FILE_SIZE};

/// calculate how many blocks hold a file of `size` bytes
/// # Arguments
/// - `size`: the logical size of a file
/// # Return
/// the number of blocks, never more than [DIRECT_BLOCKS]
/// # Example
/// ```
/// use simfs::utils::fs_size_calculator::blocks_for;
/// assert_eq!(blocks_for(0), 0);
/// assert_eq!(blocks_for(1), 1);
/// assert_eq!(blocks_for(64), 1);
/// assert_eq!(blocks_for(65), 2);
/// assert_eq!(blocks_for(100_000), 10);
/// ```
pub const fn blocks_for(size: usize) -> usize {
    let blocks = size.div_ceil(BLOCK_SIZE);
    if blocks > DIRECT_BLOCKS {
        DIRECT_BLOCKS
    } else {
        blocks
    }
}

/// split a file offset into (block index, offset inside that block)
/// # Example
/// ```
/// use simfs::utils::fs_size_calculator::block_position;
/// assert_eq!(block_position(0), (0, 0));
/// assert_eq!(block_position(70), (1, 6));
/// ```
pub const fn block_position(offset: usize) -> (usize, usize) {
    (offset / BLOCK_SIZE, offset % BLOCK_SIZE)
}

/// clamp a write of `len` bytes at `offset` so it ends inside the addressable range
/// # Example
/// ```
/// use simfs::utils::fs_size_calculator::clamp_to_max_file_size;
/// assert_eq!(clamp_to_max_file_size(600, 100), 40);
/// assert_eq!(clamp_to_max_file_size(0, 100), 100);
/// assert_eq!(clamp_to_max_file_size(640, 1), 0);
/// ```
pub const fn clamp_to_max_file_size(offset: usize, len: usize) -> usize {
    if offset >= MAX_FILE_SIZE {
        0
    } else if len > MAX_FILE_SIZE - offset {
        MAX_FILE_SIZE - offset
    } else {
        len
    }
}

/// calculate how many records of `record_size` bytes fit in one inode
/// # Example
/// ```
/// use simfs::utils::fs_size_calculator::directory_capacity;
/// assert_eq!(directory_capacity(32), 20);
/// ```
pub const fn directory_capacity(record_size: usize) -> usize {
    MAX_FILE_SIZE / record_size
}
