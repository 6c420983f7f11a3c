use std::io::{ErrorKind, Read, Write};

use log::debug;

use super::{FsError, FsResult, BLOCK_SIZE};

/// a fixed-size data block, always [BLOCK_SIZE] bytes long
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    data: Vec<u8>,
}

impl Block {
    /// allocate a zero-filled block
    pub fn new() -> FsResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(BLOCK_SIZE)?;
        data.resize(BLOCK_SIZE, 0);
        Ok(Block { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// This block is about raw copy in and copy out
impl Block {
    /// copy `content` into the block starting at offset 0
    /// # Return
    /// the number of bytes copied, at most [BLOCK_SIZE]
    pub fn write_content(&mut self, content: &[u8]) -> usize {
        self.write_content_at(0, content)
    }

    /// copy `dest.len()` bytes out of the block starting at offset 0
    pub fn read_content(&self, dest: &mut [u8]) -> usize {
        self.read_content_at(0, dest)
    }

    /// copy `content` into the block starting at `offset`,
    /// stopping at the end of the block
    pub fn write_content_at(&mut self, offset: usize, content: &[u8]) -> usize {
        if offset >= BLOCK_SIZE {
            return 0;
        }
        let len = content.len().min(BLOCK_SIZE - offset);
        self.data[offset..offset + len].copy_from_slice(&content[..len]);
        len
    }

    pub fn read_content_at(&self, offset: usize, dest: &mut [u8]) -> usize {
        if offset >= BLOCK_SIZE {
            return 0;
        }
        let len = dest.len().min(BLOCK_SIZE - offset);
        dest[..len].copy_from_slice(&self.data[offset..offset + len]);
        len
    }
}

/// This block is about persistence
impl Block {
    /// write the first `len` bytes (at most [BLOCK_SIZE]) to `w` and flush it
    pub fn save<W>(&self, len: usize, w: &mut W) -> FsResult<()>
    where
        W: Write,
    {
        let len = len.min(BLOCK_SIZE);
        w.write_all(&self.data[..len]).map_err(|e| match e.kind() {
            ErrorKind::WriteZero => FsError::ShortWrite {
                expected: len,
                written: 0,
            },
            _ => e.into(),
        })?;
        w.flush()?;
        Ok(())
    }

    /// fill the first `len` bytes (at most [BLOCK_SIZE]) from `r`
    pub fn load<R>(&mut self, len: usize, r: &mut R) -> FsResult<()>
    where
        R: Read,
    {
        let len = len.min(BLOCK_SIZE);
        let mut read = 0;
        while read < len {
            match r.read(&mut self.data[read..len]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if read == 0 && len > 0 {
            return Err(FsError::SourceExhausted);
        }
        if read != len {
            debug!("block load stopped after {read} of {len} bytes");
            return Err(FsError::ShortRead {
                expected: len,
                read,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_new_block_is_zeroed() -> anyhow::Result<()> {
        let block = Block::new()?;
        assert_eq!(block.as_bytes(), &[0u8; BLOCK_SIZE]);
        Ok(())
    }

    #[test]
    fn test_write_content_is_clamped_to_block_size() -> anyhow::Result<()> {
        let mut block = Block::new()?;
        let content = vec![7u8; BLOCK_SIZE + 10];
        assert_eq!(block.write_content(&content), BLOCK_SIZE);

        let mut out = vec![0u8; BLOCK_SIZE + 10];
        assert_eq!(block.read_content(&mut out), BLOCK_SIZE);
        assert!(out[..BLOCK_SIZE].iter().all(|b| *b == 7));
        assert!(out[BLOCK_SIZE..].iter().all(|b| *b == 0));
        Ok(())
    }

    #[test]
    fn test_write_content_at_offset() -> anyhow::Result<()> {
        let mut block = Block::new()?;
        assert_eq!(block.write_content_at(60, b"abcdef"), 4);
        assert_eq!(block.write_content_at(BLOCK_SIZE, b"x"), 0);

        let mut out = [0u8; 4];
        assert_eq!(block.read_content_at(60, &mut out), 4);
        assert_eq!(&out, b"abcd");
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> anyhow::Result<()> {
        let mut block = Block::new()?;
        block.write_content(b"hello block");
        let mut sink = Vec::new();
        block.save(BLOCK_SIZE * 2, &mut sink)?;
        assert_eq!(sink.len(), BLOCK_SIZE);

        let mut loaded = Block::new()?;
        loaded.load(BLOCK_SIZE, &mut Cursor::new(sink))?;
        assert_eq!(loaded, block);
        Ok(())
    }

    #[test]
    fn test_load_from_exhausted_source() -> anyhow::Result<()> {
        let mut block = Block::new()?;
        let err = block.load(BLOCK_SIZE, &mut Cursor::new(Vec::new()));
        assert!(matches!(err, Err(FsError::SourceExhausted)));
        Ok(())
    }

    #[test]
    fn test_load_short_read() -> anyhow::Result<()> {
        let mut block = Block::new()?;
        let err = block.load(BLOCK_SIZE, &mut Cursor::new(vec![1u8; 10]));
        assert!(matches!(
            err,
            Err(FsError::ShortRead {
                expected: BLOCK_SIZE,
                read: 10
            })
        ));
        Ok(())
    }

    /// a sink taking at most `chunk` bytes per call, and nothing past `capacity`
    struct LimitedSink {
        data: Vec<u8>,
        chunk: usize,
        capacity: usize,
    }

    impl Write for LimitedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf
                .len()
                .min(self.chunk)
                .min(self.capacity - self.data.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_save_to_trickling_sink() -> anyhow::Result<()> {
        let mut block = Block::new()?;
        block.write_content(&[9u8; BLOCK_SIZE]);
        let mut sink = LimitedSink {
            data: Vec::new(),
            chunk: 16,
            capacity: usize::MAX,
        };
        block.save(BLOCK_SIZE, &mut sink)?;
        assert_eq!(sink.data, block.as_bytes());
        Ok(())
    }

    #[test]
    fn test_save_to_full_sink() -> anyhow::Result<()> {
        let block = Block::new()?;
        let mut sink = LimitedSink {
            data: Vec::new(),
            chunk: 16,
            capacity: 20,
        };
        let err = block.save(BLOCK_SIZE, &mut sink);
        assert!(matches!(
            err,
            Err(FsError::ShortWrite {
                expected: BLOCK_SIZE,
                ..
            })
        ));
        Ok(())
    }
}
