use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::utils::{fs_size_calculator::directory_capacity, traits::ImageRecord};

use super::{FsError, FsResult, Inode, FILE_NAME_MAX, MAX_FILE_SIZE};

/// width of the name field of a packed entry, terminator included
pub const NAME_FIELD_SIZE: usize = FILE_NAME_MAX + 1;
/// a packed entry: the name field then a `u32` inode number
pub const DIRECTORY_RECORD_SIZE: usize = NAME_FIELD_SIZE + 4;
/// how many entries fit in one inode
pub const DIRECTORY_CAPACITY: usize = directory_capacity(DIRECTORY_RECORD_SIZE);

/// a NUL padded entry name of at most [FILE_NAME_MAX] bytes
#[derive(Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileName([u8; NAME_FIELD_SIZE]);

impl FileName {
    /// build a name from raw bytes, cut at the first NUL and at [FILE_NAME_MAX] bytes
    pub fn new(name: impl AsRef<[u8]>) -> FsResult<Self> {
        let name = name.as_ref();
        let end = name.iter().position(|b| *b == 0).unwrap_or(name.len());
        let name = &name[..end.min(FILE_NAME_MAX)];
        if name.is_empty() {
            return Err(FsError::InvalidName(String::new()));
        }
        let mut field = [0u8; NAME_FIELD_SIZE];
        field[..name.len()].copy_from_slice(name);
        Ok(FileName(field))
    }

    pub fn as_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(FILE_NAME_MAX);
        &self.0[..end]
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// one slot of a directory, also its packed form inside the directory inode
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirEntry {
    pub name: FileName,
    pub inode_number: u32,
}

impl ImageRecord for DirEntry {}

impl DirEntry {
    pub fn is_used(&self) -> bool {
        !self.name.is_empty()
    }
}

/// a fixed-capacity table mapping names to inode numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    table: Vec<DirEntry>,
}

impl Directory {
    /// a table of [DIRECTORY_CAPACITY] empty slots
    pub fn new() -> FsResult<Self> {
        let mut table = Vec::new();
        table.try_reserve_exact(DIRECTORY_CAPACITY)?;
        table.resize(DIRECTORY_CAPACITY, DirEntry::default());
        Ok(Directory { table })
    }

    pub const fn capacity() -> usize {
        DIRECTORY_CAPACITY
    }
}

/// This block is about entries
impl Directory {
    /// map `name` to `inode_number`
    ///
    /// an existing entry with the same name is relinked in place,
    /// otherwise the first empty slot is taken
    pub fn write_entry(&mut self, name: impl AsRef<[u8]>, inode_number: u32) -> FsResult<()> {
        let name = FileName::new(name)?;
        if let Some(entry) = self.table.iter_mut().find(|e| e.is_used() && e.name == name) {
            debug!("directory: relinking {name:?} to inode {inode_number}");
            entry.inode_number = inode_number;
            return Ok(());
        }
        let Some(slot) = self.table.iter_mut().find(|e| !e.is_used()) else {
            return Err(FsError::DirectoryFull {
                capacity: DIRECTORY_CAPACITY,
            });
        };
        *slot = DirEntry { name, inode_number };
        Ok(())
    }

    /// populated entries in table order
    pub fn entries(&self) -> Vec<DirEntry> {
        self.table.iter().filter(|e| e.is_used()).copied().collect()
    }

    pub fn count(&self) -> usize {
        self.table.iter().filter(|e| e.is_used()).count()
    }

    /// the inode number `name` maps to, if any
    pub fn entry(&self, name: impl AsRef<[u8]>) -> Option<u32> {
        let name = FileName::new(name).ok()?;
        self.table
            .iter()
            .find(|e| e.is_used() && e.name == name)
            .map(|e| e.inode_number)
    }
}

/// This block is about storing a directory as inode content
impl Directory {
    /// decode the packed entries held by a directory inode
    pub fn load_from_inode(inode: &mut Inode) -> FsResult<Self> {
        if !inode.is_dir() {
            return Err(FsError::NotDirectory(inode.number()));
        }
        let mut dir = Directory::new()?;
        let content = inode.read_all();
        for record in content.chunks_exact(DIRECTORY_RECORD_SIZE) {
            let (entry, _) = DirEntry::decode(record)?;
            if entry.is_used() {
                dir.write_entry(entry.name.as_bytes(), entry.inode_number)?;
            }
        }
        Ok(dir)
    }

    /// pack the populated entries and write them at offset 0 of `inode`
    pub fn store_to_inode(&self, inode: &mut Inode) -> FsResult<()> {
        let mut scratch = vec![0u8; MAX_FILE_SIZE];
        let mut packed = 0;
        for entry in self.table.iter().filter(|e| e.is_used()) {
            if packed + DIRECTORY_RECORD_SIZE > MAX_FILE_SIZE {
                return Err(FsError::PackOverflow { max: MAX_FILE_SIZE });
            }
            let record = entry.encode()?;
            scratch[packed..packed + record.len()].copy_from_slice(&record);
            packed += DIRECTORY_RECORD_SIZE;
        }
        let written = inode.write_data(&scratch[..packed], 0)?;
        if written != packed {
            return Err(FsError::ShortWrite {
                expected: packed,
                written,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Directory contents ({} entries) :", self.count())?;
        for entry in self.entries() {
            writeln!(f, " {} (inode {})", entry.name, entry.inode_number)?;
        }
        Ok(())
    }
}
