//! list the root directory of an image
use crate::fs::SimFS;
use anyhow::Context;
use std::{io::Write, path::Path};

/// print the root directory of the image at `image_file_path` to `out`
/// # Params
/// - `detailed`: print number, kind, size and date along with every name
pub fn ls<P, W>(image_file_path: P, detailed: bool, out: &mut W) -> anyhow::Result<()>
where
    P: AsRef<Path>,
    W: Write,
{
    let image = image_file_path.as_ref();
    let mut fs = SimFS::load_from_file(image)
        .with_context(|| format!("can't load image file {}", image.display()))?;
    fs.ls(detailed, out).context("can't list the root directory")?;
    Ok(())
}

/// print the superblock, every inode and the root directory to `out`
pub fn dump<P, W>(image_file_path: P, out: &mut W) -> anyhow::Result<()>
where
    P: AsRef<Path>,
    W: Write,
{
    let image = image_file_path.as_ref();
    let mut fs = SimFS::load_from_file(image)
        .with_context(|| format!("can't load image file {}", image.display()))?;
    write!(out, "{fs}")?;
    let root = fs.root_directory().context("can't read the root directory")?;
    writeln!(out)?;
    write!(out, "{root}")?;
    Ok(())
}
