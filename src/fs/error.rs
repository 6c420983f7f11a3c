//! error taxonomy of the storage engine
use thiserror::Error;

/// every failure the storage engine can report
#[derive(Debug, Error)]
pub enum FsError {
    /// a block, inode table or directory table could not be allocated
    #[error("allocation failed: {0}")]
    Allocation(#[from] std::collections::TryReserveError),

    /// an offset beyond what the direct block table can address
    #[error("offset {offset} is beyond the maximum file size {max}")]
    OutOfRange { offset: u64, max: u64 },

    #[error("directory is full ({capacity} entries)")]
    DirectoryFull { capacity: usize },

    #[error("invalid entry name: {0:?}")]
    InvalidName(String),

    #[error("inode {0} is not a directory")]
    NotDirectory(u32),

    /// packing a directory would not fit in one inode
    #[error("packed directory exceeds {max} bytes")]
    PackOverflow { max: usize },

    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    #[error("short read: {read} of {expected} bytes")]
    ShortRead { expected: usize, read: usize },

    #[error("source is already exhausted")]
    SourceExhausted,

    #[error("nothing was written")]
    NothingWritten,

    #[error("root directory inode not found")]
    RootMissing,

    #[error("corrupt image: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

pub type FsResult<T> = Result<T, FsError>;
