//! what does our filesystem look like in the memory

use std::{
    collections::HashMap,
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
};

use byte_unit::{Byte, ByteUnit};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::utils::{
    time_util::{self, Timestamp},
    traits::ImageRecord,
};

use super::{
    Directory, FileKind, FileName, FsError, FsResult, Inode, SuperBlock, BLOCK_SIZE,
    MAX_FILE_SIZE, ROOT_INODE,
};

/// the inode count as laid out in the image file, right after the superblock
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
struct InodeCount(i32);

impl ImageRecord for InodeCount {}

/// it has the following layout:
/// - superblock
/// - inodes, in the order they were registered; the root directory is inode 0
#[derive(Debug)]
pub struct SimFS {
    superblock: SuperBlock,
    inodes: Vec<Inode>,
    /// inode number -> position in `inodes`
    index: HashMap<u32, usize>,
}

/// the outcome of a general file ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingested {
    pub inode_number: u32,
    pub written: usize,
    /// the source was longer than [MAX_FILE_SIZE]
    pub truncated: bool,
}

/// one line of a root directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry {
    Resolved {
        name: FileName,
        inode_number: u32,
        kind: FileKind,
        size: usize,
        modified_at: Timestamp,
    },
    /// the entry names an inode the filesystem doesn't have
    Dangling { name: FileName, inode_number: u32 },
}

impl SimFS {
    /// create a filesystem holding only the root directory
    /// # Params
    /// - `volume_name`: cut at [VOLUME_NAME_MAX](super::VOLUME_NAME_MAX) bytes
    pub fn new(volume_name: impl AsRef<[u8]>) -> Self {
        let mut fs = SimFS {
            superblock: SuperBlock::new(volume_name),
            inodes: Vec::new(),
            index: HashMap::new(),
        };
        fs.register(Inode::new(ROOT_INODE, FileKind::Directory));
        fs
    }

    /// tear the filesystem down, releasing every inode and its blocks
    pub fn destroy(self) {
        debug!(
            "destroying filesystem {} ({} inodes)",
            self.superblock.volume_name(),
            self.inodes.len()
        );
        drop(self);
    }
}

/// This block is about the inode registry
impl SimFS {
    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    pub fn inode_count(&self) -> usize {
        self.inodes.len()
    }

    /// inodes in registration order
    pub fn inodes(&self) -> impl Iterator<Item = &Inode> {
        self.inodes.iter()
    }

    pub fn inode(&self, number: u32) -> Option<&Inode> {
        self.index.get(&number).map(|i| &self.inodes[*i])
    }

    pub fn inode_mut(&mut self, number: u32) -> Option<&mut Inode> {
        self.index.get(&number).map(|i| &mut self.inodes[*i])
    }

    /// numbers are handed out sequentially and never reused
    fn next_inode_number(&self) -> FsResult<u32> {
        let number = self.inodes.len() as u32;
        if self.index.contains_key(&number) {
            return Err(FsError::Corrupt(format!(
                "inode number {number} is already in use"
            )));
        }
        Ok(number)
    }

    fn register(&mut self, inode: Inode) {
        self.index.insert(inode.number(), self.inodes.len());
        self.inodes.push(inode);
    }

    fn root_mut(&mut self) -> FsResult<&mut Inode> {
        self.inode_mut(ROOT_INODE).ok_or(FsError::RootMissing)
    }

    /// decode the root directory
    pub fn root_directory(&mut self) -> FsResult<Directory> {
        Directory::load_from_inode(self.root_mut()?)
    }

    /// map `name` to `inode_number` in the root directory and store it back
    fn link_into_root(&mut self, name: &str, inode_number: u32) -> FsResult<()> {
        let root = self.root_mut()?;
        let mut dir = Directory::load_from_inode(root)?;
        dir.write_entry(name, inode_number)?;
        dir.store_to_inode(root)
    }
}

/// This block is about ingesting external files
impl SimFS {
    /// legacy ingestion: store the first block of the file at `path`
    /// in a new inode, without linking it into the root directory
    /// # Return
    /// the number of bytes written
    pub fn ingest_small_file<P>(&mut self, path: P, kind: FileKind) -> FsResult<usize>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            error!("ingest_small_file: can't open {}: {e}", path.display());
            e
        })?;
        self.ingest_small_reader(file, kind)
    }

    /// [SimFS::ingest_small_file] from any reader
    pub fn ingest_small_reader<R>(&mut self, source: R, kind: FileKind) -> FsResult<usize>
    where
        R: Read,
    {
        let mut buf = Vec::with_capacity(BLOCK_SIZE);
        source.take(BLOCK_SIZE as u64).read_to_end(&mut buf)?;

        let number = self.next_inode_number()?;
        let mut inode = Inode::new(number, kind);
        let written = inode.write_data_one_block(&buf)?;
        if written == 0 {
            error!("ingest_small_file: nothing written to inode {number}");
            return Err(FsError::NothingWritten);
        }

        self.register(inode);
        self.superblock.update_modified_at();
        info!("ingest_small_file: {written} bytes into inode {number}");
        Ok(written)
    }

    /// general ingestion: store the file at `path` in a new inode
    /// and link it into the root directory under the file's name
    pub fn ingest_file<P>(&mut self, path: P, kind: FileKind) -> FsResult<Ingested>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| FsError::InvalidName(path.display().to_string()))?;
        let file = File::open(path).map_err(|e| {
            error!("ingest_file: can't open {}: {e}", path.display());
            e
        })?;
        self.ingest_reader(&name, file, kind)
    }

    /// [SimFS::ingest_file] from any seekable source, linked as `name`
    ///
    /// the new inode is registered only once its content is written
    /// and the root directory links it
    pub fn ingest_reader<R>(&mut self, name: &str, mut source: R, kind: FileKind) -> FsResult<Ingested>
    where
        R: Read + Seek,
    {
        let len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;
        let truncated = len > MAX_FILE_SIZE as u64;
        let to_read = len.min(MAX_FILE_SIZE as u64) as usize;
        if truncated {
            warn!(
                "ingest_file: {name} is {}, truncated to {}",
                Byte::from_bytes(len as _).get_appropriate_unit(true),
                Byte::from_bytes(to_read as _).get_adjusted_unit(ByteUnit::B)
            );
        }

        let mut buf = Vec::with_capacity(to_read);
        source.take(to_read as u64).read_to_end(&mut buf)?;
        if buf.len() != to_read {
            error!("ingest_file: read {} of {to_read} bytes of {name}", buf.len());
            return Err(FsError::ShortRead {
                expected: to_read,
                read: buf.len(),
            });
        }

        let number = self.next_inode_number()?;
        let mut inode = Inode::new(number, kind);
        let written = inode.write_data(&buf, 0).map_err(|e| {
            error!("ingest_file: can't write inode {number}: {e}");
            e
        })?;
        // on failure the new inode is dropped along with its blocks
        self.link_into_root(name, number).map_err(|e| {
            error!("ingest_file: can't link {name} to inode {number}: {e}");
            e
        })?;

        self.register(inode);
        self.superblock.update_modified_at();
        info!("ingest_file: {name} -> inode {number}, {written} bytes");
        Ok(Ingested {
            inode_number: number,
            written,
            truncated,
        })
    }
}

/// This block is about saving and loading the whole image
impl SimFS {
    /// write the superblock, the inode count, then every inode in order
    ///
    /// bytes already written are left in place when a later step fails
    pub fn save_image<W>(&self, w: &mut W) -> FsResult<()>
    where
        W: Write,
    {
        self.superblock.encode_into(w)?;
        InodeCount(self.inodes.len() as i32).encode_into(w)?;
        for inode in &self.inodes {
            inode.save(w).map_err(|e| {
                error!("save_image: can't save inode {}: {e}", inode.number());
                e
            })?;
        }
        w.flush()?;
        Ok(())
    }

    /// read an image written by [SimFS::save_image]
    pub fn load_image<R>(r: &mut R) -> FsResult<Self>
    where
        R: Read,
    {
        let superblock = SuperBlock::decode_from(r)?;
        let InodeCount(count) = InodeCount::decode_from(r)?;
        if count < 0 {
            error!("load_image: invalid inode count {count}");
            return Err(FsError::Corrupt(format!("inode count {count}")));
        }

        let mut fs = SimFS {
            superblock,
            inodes: Vec::new(),
            index: HashMap::new(),
        };
        for i in 0..count {
            let inode = Inode::load(r).map_err(|e| {
                error!("load_image: can't load inode {i}: {e}");
                e
            })?;
            if fs.index.contains_key(&inode.number()) {
                return Err(FsError::Corrupt(format!(
                    "inode number {} appears twice",
                    inode.number()
                )));
            }
            fs.register(inode);
        }
        Ok(fs)
    }

    pub fn save_to_file<P>(&self, path: P) -> FsResult<()>
    where
        P: AsRef<Path>,
    {
        let file = File::create(path.as_ref())?;
        let mut w = BufWriter::new(file);
        self.save_image(&mut w)?;
        info!(
            "saved {} inodes to {}",
            self.inodes.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn load_from_file<P>(path: P) -> FsResult<Self>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path.as_ref())?;
        let fs = Self::load_image(&mut BufReader::new(file))?;
        info!(
            "loaded {} inodes from {}",
            fs.inodes.len(),
            path.as_ref().display()
        );
        Ok(fs)
    }

    /// replace `self` with the image at `path`, leaving `self` untouched on failure
    pub fn reload_from_file<P>(&mut self, path: P) -> FsResult<()>
    where
        P: AsRef<Path>,
    {
        *self = Self::load_from_file(path)?;
        Ok(())
    }
}

/// This block is about listing the root directory
impl SimFS {
    /// resolve every root directory entry against the inode registry
    pub fn list_root(&mut self) -> FsResult<Vec<ListEntry>> {
        let dir = self.root_directory()?;
        let entries = dir
            .entries()
            .into_iter()
            .map(|entry| match self.inode(entry.inode_number) {
                Some(inode) => ListEntry::Resolved {
                    name: entry.name,
                    inode_number: entry.inode_number,
                    kind: inode.kind(),
                    size: inode.size(),
                    modified_at: inode.modified_at(),
                },
                None => {
                    warn!(
                        "ls: inode {} referenced by {:?} doesn't exist",
                        entry.inode_number, entry.name
                    );
                    ListEntry::Dangling {
                        name: entry.name,
                        inode_number: entry.inode_number,
                    }
                }
            })
            .collect();
        Ok(entries)
    }

    /// print the root directory to `out`: names only, or
    /// `number kind size date name` per entry when `detailed`,
    /// with a `DANGLING` line for entries whose inode is missing
    pub fn ls<W>(&mut self, detailed: bool, out: &mut W) -> FsResult<()>
    where
        W: Write,
    {
        let entries = self.list_root()?;
        info!("{} files in the root directory", entries.len());
        for entry in entries {
            match entry {
                ListEntry::Resolved {
                    name,
                    inode_number,
                    kind,
                    size,
                    modified_at,
                } if detailed => writeln!(
                    out,
                    "{inode_number:<3} {kind:<12} {size:>6} {} {name}",
                    time_util::format_timestamp(modified_at)
                )?,
                ListEntry::Dangling { name, inode_number } if detailed => {
                    error!("ls: {name:?} points to missing inode {inode_number}");
                    writeln!(out, "?   DANGLING -> inode {inode_number} {name}")?
                }
                ListEntry::Resolved { name, .. } | ListEntry::Dangling { name, .. } => {
                    writeln!(out, "{name}")?
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for SimFS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.superblock)?;
        writeln!(f, "Inodes :")?;
        if self.inodes.is_empty() {
            return writeln!(f, "  (no inode in the filesystem)");
        }
        for (i, inode) in self.inodes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{inode}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{DirEntry, DIRECTORY_CAPACITY, DIRECTORY_RECORD_SIZE};
    use std::io::Cursor;

    fn ingest(fs: &mut SimFS, name: &str, content: &[u8]) -> FsResult<Ingested> {
        fs.ingest_reader(name, Cursor::new(content.to_vec()), FileKind::Ordinary)
    }

    #[test]
    fn test_new_filesystem_has_root_only() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        assert_eq!(fs.inode_count(), 1);
        let root = fs.inode(ROOT_INODE).expect("root inode");
        assert_eq!(root.kind(), FileKind::Directory);
        assert_eq!(root.size(), 0);
        assert_eq!(fs.root_directory()?.count(), 0);
        assert_eq!(fs.superblock().volume_name(), "Disk");
        Ok(())
    }

    #[test]
    fn test_ingest_links_into_root() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        let ingested = ingest(&mut fs, "a.txt", &[b'a'; 20])?;
        assert_eq!(
            ingested,
            Ingested {
                inode_number: 1,
                written: 20,
                truncated: false
            }
        );
        assert_eq!(fs.inode_count(), 2);
        assert_eq!(fs.inode(1).map(Inode::size), Some(20));
        let dir = fs.root_directory()?;
        assert_eq!(dir.entry("a.txt"), Some(1));
        assert_eq!(fs.inode(ROOT_INODE).map(Inode::size), Some(DIRECTORY_RECORD_SIZE));
        Ok(())
    }

    #[test]
    fn test_ingest_truncates_large_source() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        let ingested = ingest(&mut fs, "big", &vec![7u8; 10 * BLOCK_SIZE + 1])?;
        assert!(ingested.truncated);
        assert_eq!(ingested.written, MAX_FILE_SIZE);
        assert_eq!(fs.inode(ingested.inode_number).map(Inode::size), Some(MAX_FILE_SIZE));
        Ok(())
    }

    #[test]
    fn test_ingest_empty_source() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        let ingested = ingest(&mut fs, "empty", &[])?;
        assert_eq!(ingested.written, 0);
        assert_eq!(fs.root_directory()?.entry("empty"), Some(1));
        Ok(())
    }

    #[test]
    fn test_ingest_same_name_relinks() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        ingest(&mut fs, "a.txt", b"first")?;
        ingest(&mut fs, "a.txt", b"second")?;
        assert_eq!(fs.inode_count(), 3);
        let dir = fs.root_directory()?;
        assert_eq!(dir.count(), 1);
        assert_eq!(dir.entry("a.txt"), Some(2));
        Ok(())
    }

    #[test]
    fn test_failed_link_does_not_register_inode() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        for i in 0..DIRECTORY_CAPACITY {
            ingest(&mut fs, &format!("f{i}"), b"x")?;
        }
        let count = fs.inode_count();
        let modified_at = fs.superblock().modified_at;

        let err = ingest(&mut fs, "overflow", b"data");
        assert!(matches!(err, Err(FsError::DirectoryFull { .. })));
        assert_eq!(fs.inode_count(), count);
        assert!(fs.inode(count as u32).is_none());
        assert_eq!(fs.superblock().modified_at, modified_at);

        // an invalid name is rejected the same way
        assert!(matches!(ingest(&mut fs, "", b"data"), Err(FsError::InvalidName(_))));
        assert_eq!(fs.inode_count(), count);
        Ok(())
    }

    #[test]
    fn test_ingest_without_root_fails() -> anyhow::Result<()> {
        let mut fs = SimFS {
            superblock: SuperBlock::new("Disk"),
            inodes: Vec::new(),
            index: HashMap::new(),
        };
        assert!(matches!(ingest(&mut fs, "a", b"x"), Err(FsError::RootMissing)));
        assert_eq!(fs.inode_count(), 0);
        Ok(())
    }

    #[test]
    fn test_ingest_small_reader_skips_directory() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        let written = fs.ingest_small_reader(Cursor::new(vec![1u8; 100]), FileKind::Other)?;
        assert_eq!(written, BLOCK_SIZE);
        assert_eq!(fs.inode_count(), 2);
        assert_eq!(fs.inode(1).map(Inode::kind), Some(FileKind::Other));
        assert_eq!(fs.root_directory()?.count(), 0);

        let err = fs.ingest_small_reader(Cursor::new(Vec::new()), FileKind::Ordinary);
        assert!(matches!(err, Err(FsError::NothingWritten)));
        assert_eq!(fs.inode_count(), 2);
        Ok(())
    }

    #[test]
    fn test_save_and_load_image() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        ingest(&mut fs, "empty", &[])?;
        ingest(&mut fs, "one-block", &[3u8; BLOCK_SIZE])?;
        ingest(&mut fs, "full", &vec![9u8; MAX_FILE_SIZE])?;
        fs.ingest_small_reader(Cursor::new(b"legacy".to_vec()), FileKind::Ordinary)?;

        let mut image = Vec::new();
        fs.save_image(&mut image)?;
        let loaded = SimFS::load_image(&mut Cursor::new(image))?;

        assert_eq!(loaded.superblock(), fs.superblock());
        assert_eq!(loaded.inode_count(), fs.inode_count());
        for (a, b) in loaded.inodes().zip(fs.inodes()) {
            assert_eq!(a, b);
        }
        Ok(())
    }

    /// a healthy sink that accepts at most 16 bytes per call
    struct TricklingSink(Vec<u8>);

    impl Write for TricklingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(16);
            self.0.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_save_image_to_trickling_sink() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        ingest(&mut fs, "a.txt", &[b'a'; 20])?;
        let mut expected = Vec::new();
        fs.save_image(&mut expected)?;

        let mut sink = TricklingSink(Vec::new());
        fs.save_image(&mut sink)?;
        assert_eq!(sink.0, expected);
        let loaded = SimFS::load_image(&mut Cursor::new(sink.0))?;
        assert_eq!(loaded.inode(1).map(Inode::size), Some(20));
        Ok(())
    }

    #[test]
    fn test_image_layout() -> anyhow::Result<()> {
        let fs = SimFS::new("Disk");
        let mut image = Vec::new();
        fs.save_image(&mut image)?;
        // superblock, inode count, then the empty root inode header
        assert_eq!(image.len(), 33 + 4 + 40);
        assert_eq!(&image[33..37], &1i32.to_le_bytes());
        Ok(())
    }

    #[test]
    fn test_load_rejects_negative_count() -> anyhow::Result<()> {
        let mut image = SuperBlock::new("Disk").encode()?;
        image.extend_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(
            SimFS::load_image(&mut Cursor::new(image)),
            Err(FsError::Corrupt(_))
        ));
        Ok(())
    }

    #[test]
    fn test_load_truncated_image_fails() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        ingest(&mut fs, "a", &[1u8; 100])?;
        let mut image = Vec::new();
        fs.save_image(&mut image)?;
        image.truncate(image.len() - 1);
        assert!(SimFS::load_image(&mut Cursor::new(image)).is_err());
        Ok(())
    }

    #[test]
    fn test_list_reports_dangling_entries() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        ingest(&mut fs, "a.txt", b"hello")?;
        let mut dir = fs.root_directory()?;
        dir.write_entry("ghost", 42)?;
        dir.store_to_inode(fs.root_mut()?)?;

        let entries = fs.list_root()?;
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], ListEntry::Resolved { inode_number: 1, size: 5, .. }));
        assert!(matches!(entries[1], ListEntry::Dangling { inode_number: 42, .. }));

        let mut out = Vec::new();
        fs.ls(true, &mut out)?;
        let out = String::from_utf8(out)?;
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("a.txt"));
        assert_eq!(lines[1], "?   DANGLING -> inode 42 ghost");

        let mut out = Vec::new();
        fs.ls(false, &mut out)?;
        assert_eq!(String::from_utf8(out)?, "a.txt\nghost\n");
        Ok(())
    }

    #[test]
    fn test_root_directory_uses_packed_records() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        ingest(&mut fs, "a.txt", b"hello")?;
        let root = fs.inode_mut(ROOT_INODE).expect("root inode");
        let content = root.read_all();
        let (entry, _) = DirEntry::decode(&content)?;
        assert_eq!(entry.name.as_bytes(), b"a.txt");
        assert_eq!(entry.inode_number, 1);
        Ok(())
    }

    #[test]
    fn test_display() -> anyhow::Result<()> {
        let mut fs = SimFS::new("Disk");
        ingest(&mut fs, "a.txt", b"hello")?;
        let dump = fs.to_string();
        assert!(dump.starts_with("Filesystem Disk, superblock :"));
        assert!(dump.contains("--------Inode----[0]:"));
        assert!(dump.contains("--------Inode----[1]:"));
        assert!(dump.contains("Block 0 : hello"));
        fs.destroy();
        Ok(())
    }
}
