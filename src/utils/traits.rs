use std::io::{Read, Write};

use serde::{de::DeserializeOwned, Serialize};

use crate::fs::FsResult;

/// Trait for records persisted in the image file with a fixed-width layout
/// # Note
/// encoding uses the `bincode` legacy configuration:
/// little endian, fixed-width integers, enum variants as `u32`,
/// and arrays without a length prefix
pub trait ImageRecord: Serialize + DeserializeOwned {
    /// serialize into a writer implementing [Write](std::io::Write)
    /// # Returns
    /// The number of bytes written if successful
    fn encode_into<W>(&self, w: &mut W) -> FsResult<usize>
    where
        W: Write,
    {
        let config = bincode::config::legacy();
        bincode::serde::encode_into_std_write(self, w, config).map_err(|e| e.into())
    }

    /// serialize into a [Vec](std::vec::Vec)
    fn encode(&self) -> FsResult<Vec<u8>> {
        let config = bincode::config::legacy();
        bincode::serde::encode_to_vec(self, config).map_err(|e| e.into())
    }

    /// deserialize from a reader implementing [Read](std::io::Read)
    fn decode_from<R>(r: &mut R) -> FsResult<Self>
    where
        R: Read,
    {
        let config = bincode::config::legacy();
        bincode::serde::decode_from_std_read(r, config).map_err(|e| e.into())
    }

    /// deserialize from a slice
    /// # Returns
    /// A tuple containing the deserialized object and the number of bytes read
    fn decode(buf: &[u8]) -> FsResult<(Self, usize)> {
        let config = bincode::config::legacy();
        bincode::serde::decode_from_slice(buf, config).map_err(|e| e.into())
    }
}
