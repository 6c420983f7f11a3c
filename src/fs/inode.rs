use std::fmt;
use std::io::{Read, Write};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::utils::{
    fs_size_calculator::{block_position, blocks_for, clamp_to_max_file_size},
    time_util::{self, Timestamp},
    traits::ImageRecord,
};

use super::{Block, FileKind, FsError, FsResult, BLOCK_SIZE, DIRECT_BLOCKS, MAX_FILE_SIZE};

/// the metadata of an inode as laid out in the image file,
/// followed there by `blocks_for(size)` raw blocks
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeHeader {
    pub number: u32,
    pub kind: FileKind,
    pub size: i64,
    pub accessed_at: Timestamp,
    pub modified_at: Timestamp,
    pub metadata_changed_at: Timestamp,
}

impl ImageRecord for InodeHeader {}

/// which timestamps an operation asks to refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Touched {
    pub accessed: bool,
    pub content: bool,
    pub metadata: bool,
}

impl Touched {
    pub const NONE: Touched = Touched {
        accessed: false,
        content: false,
        metadata: false,
    };
    pub const ACCESS: Touched = Touched {
        accessed: true,
        content: false,
        metadata: false,
    };
    pub const WRITE: Touched = Touched {
        accessed: false,
        content: true,
        metadata: true,
    };
}

/// a file: metadata plus a direct table of owned blocks
///
/// slot `i` holds the bytes at offsets `[i * BLOCK_SIZE, (i + 1) * BLOCK_SIZE)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    number: u32,
    kind: FileKind,
    size: usize,
    direct_blocks: [Option<Block>; DIRECT_BLOCKS],
    accessed_at: Timestamp,
    modified_at: Timestamp,
    metadata_changed_at: Timestamp,
}

impl Inode {
    pub fn new(number: u32, kind: FileKind) -> Self {
        let now = time_util::now();
        Inode {
            number,
            kind,
            size: 0,
            direct_blocks: std::array::from_fn(|_| None),
            accessed_at: now,
            modified_at: now,
            metadata_changed_at: now,
        }
    }

    /// the largest file an inode can hold
    pub const fn max_file_size() -> usize {
        MAX_FILE_SIZE
    }
}

/// This block is about file metadata
impl Inode {
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn accessed_at(&self) -> Timestamp {
        self.accessed_at
    }

    pub fn modified_at(&self) -> Timestamp {
        self.modified_at
    }

    pub fn metadata_changed_at(&self) -> Timestamp {
        self.metadata_changed_at
    }

    pub fn header(&self) -> InodeHeader {
        InodeHeader {
            number: self.number,
            kind: self.kind,
            size: self.size as i64,
            accessed_at: self.accessed_at,
            modified_at: self.modified_at,
            metadata_changed_at: self.metadata_changed_at,
        }
    }

    /// apply the timestamp updates an operation reported
    pub fn touch(&mut self, touched: Touched) {
        let now = time_util::now();
        if touched.accessed {
            self.accessed_at = now;
        }
        if touched.content {
            self.modified_at = now;
        }
        if touched.metadata {
            self.metadata_changed_at = now;
        }
    }
}

/// This block is about the direct block table
impl Inode {
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.direct_blocks.get(index).and_then(Option::as_ref)
    }

    pub fn occupied_blocks(&self) -> usize {
        self.direct_blocks.iter().filter(|b| b.is_some()).count()
    }

    /// occupied slots must form a prefix of the table
    pub fn blocks_are_contiguous(&self) -> bool {
        let occupied = self.occupied_blocks();
        self.direct_blocks[..occupied].iter().all(Option::is_some)
    }

    fn first_occupied(&self) -> Option<usize> {
        self.direct_blocks.iter().position(Option::is_some)
    }
}

/// This block is about the legacy single-block file mode
impl Inode {
    /// store at most one block of `content`, replacing the logical size
    pub fn write_data_one_block(&mut self, content: &[u8]) -> FsResult<usize> {
        let (written, touched) = self.write_one_block(content)?;
        self.touch(touched);
        Ok(written)
    }

    /// read at most one block, never past the logical size
    pub fn read_data_one_block(&mut self, dest: &mut [u8]) -> usize {
        let (read, touched) = self.read_one_block(dest);
        self.touch(touched);
        read
    }

    /// [Inode::write_data_one_block] without touching the clock
    pub fn write_one_block(&mut self, content: &[u8]) -> FsResult<(usize, Touched)> {
        let content = &content[..content.len().min(BLOCK_SIZE)];
        let index = match self.first_occupied() {
            Some(index) => index,
            None => {
                self.direct_blocks[0] = Some(Block::new()?);
                0
            }
        };
        let written = match self.direct_blocks[index].as_mut() {
            Some(block) => block.write_content(content),
            None => 0,
        };
        self.size = written;
        Ok((written, Touched::WRITE))
    }

    /// [Inode::read_data_one_block] without touching the clock
    pub fn read_one_block(&self, dest: &mut [u8]) -> (usize, Touched) {
        if self.size == 0 {
            return (0, Touched::NONE);
        }
        let len = dest.len().min(BLOCK_SIZE).min(self.size);
        let read = self
            .first_occupied()
            .and_then(|index| self.direct_blocks[index].as_ref())
            .map_or(0, |block| block.read_content(&mut dest[..len]));
        (read, Touched::ACCESS)
    }
}

/// This block is about offset based reads and writes
impl Inode {
    /// write `content` at `offset`, allocating blocks on the way
    /// # Return
    /// the number of bytes written, which can be short when the file is full
    /// or a block can't be allocated
    pub fn write_data(&mut self, content: &[u8], offset: u64) -> FsResult<usize> {
        let (written, touched) = self.write_at(content, offset)?;
        self.touch(touched);
        Ok(written)
    }

    /// read into `dest` from `offset`, never past the logical size
    pub fn read_data(&mut self, dest: &mut [u8], offset: u64) -> usize {
        let (read, touched) = self.read_at(dest, offset);
        self.touch(touched);
        read
    }

    /// [Inode::write_data] without touching the clock
    pub fn write_at(&mut self, content: &[u8], offset: u64) -> FsResult<(usize, Touched)> {
        if offset >= MAX_FILE_SIZE as u64 {
            return Err(FsError::OutOfRange {
                offset,
                max: MAX_FILE_SIZE as u64,
            });
        }
        let offset = offset as usize;
        let to_write = clamp_to_max_file_size(offset, content.len());
        if to_write == 0 {
            return Ok((0, Touched::NONE));
        }

        // slots before the first touched block read back as zeros
        let (first_index, _) = block_position(offset);
        for index in 0..first_index {
            if self.direct_blocks[index].is_some() {
                continue;
            }
            match Block::new() {
                Ok(block) => self.direct_blocks[index] = Some(block),
                Err(e) => {
                    warn!("inode {}: can't allocate gap block {index}: {e}", self.number);
                    return Ok((0, Touched::NONE));
                }
            }
        }

        let mut total = 0;
        while total < to_write {
            let (index, offset_in_block) = block_position(offset + total);
            let slot = &mut self.direct_blocks[index];
            if slot.is_none() {
                match Block::new() {
                    Ok(block) => *slot = Some(block),
                    Err(e) => {
                        warn!("inode {}: can't allocate block {index}: {e}", self.number);
                        break;
                    }
                }
            }
            let chunk = (to_write - total).min(BLOCK_SIZE - offset_in_block);
            let written = match slot.as_mut() {
                Some(block) => block.write_content_at(offset_in_block, &content[total..total + chunk]),
                None => 0,
            };
            if written == 0 {
                break;
            }
            total += written;
        }
        debug!(
            "inode {}: wrote {total} of {} bytes at offset {offset}",
            self.number,
            content.len()
        );
        debug_assert!(self.blocks_are_contiguous());

        self.size = self.size.max(offset + total);
        let touched = if total > 0 {
            Touched::WRITE
        } else {
            Touched::NONE
        };
        Ok((total, touched))
    }

    /// [Inode::read_data] without touching the clock
    pub fn read_at(&self, dest: &mut [u8], offset: u64) -> (usize, Touched) {
        if offset >= self.size as u64 {
            return (0, Touched::NONE);
        }
        let offset = offset as usize;
        let to_read = dest.len().min(self.size - offset);

        let mut total = 0;
        while total < to_read {
            let (index, offset_in_block) = block_position(offset + total);
            let Some(block) = self.block(index) else {
                break;
            };
            let chunk = (to_read - total).min(BLOCK_SIZE - offset_in_block);
            let read = block.read_content_at(offset_in_block, &mut dest[total..total + chunk]);
            if read == 0 {
                break;
            }
            total += read;
        }
        (total, Touched::ACCESS)
    }

    /// the whole logical content of the file
    pub fn read_all(&mut self) -> Vec<u8> {
        let mut buf = vec![0u8; self.size];
        let read = self.read_data(&mut buf, 0);
        buf.truncate(read);
        buf
    }
}

/// This block is about persistence
impl Inode {
    /// write the header then `blocks_for(size)` blocks,
    /// substituting a zero block for any absent slot
    pub fn save<W>(&self, w: &mut W) -> FsResult<()>
    where
        W: Write,
    {
        self.header().encode_into(w)?;
        for index in 0..blocks_for(self.size) {
            match self.block(index) {
                Some(block) => block.save(BLOCK_SIZE, w)?,
                None => {
                    debug!("inode {}: saving zero block for slot {index}", self.number);
                    Block::new()?.save(BLOCK_SIZE, w)?
                }
            }
        }
        w.flush()?;
        Ok(())
    }

    /// read an inode written by [Inode::save]
    pub fn load<R>(r: &mut R) -> FsResult<Self>
    where
        R: Read,
    {
        let header = InodeHeader::decode_from(r)?;
        if header.size < 0 || header.size > MAX_FILE_SIZE as i64 {
            return Err(FsError::Corrupt(format!(
                "inode {} has size {}",
                header.number, header.size
            )));
        }
        let mut inode = Inode {
            number: header.number,
            kind: header.kind,
            size: header.size as usize,
            direct_blocks: std::array::from_fn(|_| None),
            accessed_at: header.accessed_at,
            modified_at: header.modified_at,
            metadata_changed_at: header.metadata_changed_at,
        };
        for index in 0..blocks_for(inode.size) {
            let mut block = Block::new()?;
            block.load(BLOCK_SIZE, r)?;
            inode.direct_blocks[index] = Some(block);
        }
        Ok(inode)
    }
}

impl fmt::Display for Inode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--------Inode----[{}]:", self.number)?;
        writeln!(f, "  type : {}", self.kind)?;
        writeln!(f, "  size : {} bytes", self.size)?;
        writeln!(
            f,
            "  last access : {}",
            time_util::format_timestamp(self.accessed_at)
        )?;
        writeln!(
            f,
            "  last modification : {}",
            time_util::format_timestamp(self.modified_at)
        )?;
        writeln!(
            f,
            "  last inode modification : {}",
            time_util::format_timestamp(self.metadata_changed_at)
        )?;
        if self.size == 0 {
            return Ok(());
        }
        writeln!(f, "  Data :")?;
        for index in 0..blocks_for(self.size) {
            let Some(block) = self.block(index) else {
                continue;
            };
            // printable ASCII as is, NUL ends the block
            let text: String = block
                .as_bytes()
                .iter()
                .take_while(|b| **b != 0)
                .map(|b| match b {
                    32..=126 => *b as char,
                    _ => '?',
                })
                .collect();
            writeln!(f, "  Block {index} : {text}")?;
        }
        Ok(())
    }
}
