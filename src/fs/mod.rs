//! our simulated filesystem
pub mod block;
pub mod directory;
pub mod error;
pub mod filekind;
pub mod fs_layout;
pub mod inode;
pub mod superblock;
pub use block::*;
pub use directory::*;
pub use error::*;
pub use filekind::*;
pub use fs_layout::*;
pub use inode::*;
pub use superblock::*;

/// bytes per data block
pub const BLOCK_SIZE: usize = 64;
/// slots in the direct block table of an inode
pub const DIRECT_BLOCKS: usize = 10;
/// the largest file an inode can hold
pub const MAX_FILE_SIZE: usize = DIRECT_BLOCKS * BLOCK_SIZE;
/// longest volume name kept in the superblock, terminator excluded
pub const VOLUME_NAME_MAX: usize = 24;
/// longest directory entry name, terminator excluded
pub const FILE_NAME_MAX: usize = 27;
/// the root directory is always inode 0
pub const ROOT_INODE: u32 = 0;
