use std::fmt;

use byte_unit::{Byte, ByteUnit};
use serde::{Deserialize, Serialize};

use crate::utils::{
    time_util::{self, Timestamp},
    traits::ImageRecord,
};

use super::{BLOCK_SIZE, VOLUME_NAME_MAX};

/// The superblock of this filesystem
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    /// NUL padded volume name, at most [VOLUME_NAME_MAX] bytes
    volume_name: [u8; VOLUME_NAME_MAX + 1],
    pub modified_at: Timestamp,
}

impl ImageRecord for SuperBlock {}

impl SuperBlock {
    /// the name is cut at [VOLUME_NAME_MAX] bytes
    pub fn new(volume_name: impl AsRef<[u8]>) -> Self {
        let name = volume_name.as_ref();
        let end = name.iter().position(|b| *b == 0).unwrap_or(name.len());
        let name = &name[..end.min(VOLUME_NAME_MAX)];
        let mut field = [0u8; VOLUME_NAME_MAX + 1];
        field[..name.len()].copy_from_slice(name);
        SuperBlock {
            volume_name: field,
            modified_at: time_util::now(),
        }
    }

    pub fn volume_name(&self) -> String {
        let end = self
            .volume_name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(VOLUME_NAME_MAX);
        String::from_utf8_lossy(&self.volume_name[..end]).into_owned()
    }

    pub fn update_modified_at(&mut self) {
        self.modified_at = time_util::now();
    }
}

impl fmt::Display for SuperBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Filesystem {}, superblock :", self.volume_name())?;
        writeln!(
            f,
            "block size = {}, last modified = {}",
            Byte::from_bytes(BLOCK_SIZE as _).get_adjusted_unit(ByteUnit::B),
            time_util::format_timestamp(self.modified_at)
        )
    }
}
