//! create our filesystem
use crate::fs::SimFS;
use anyhow::Context;
use log::info;
use std::{fs::OpenOptions, io::BufWriter, path::Path};

/// create a new filesystem holding only the root directory, given the path of the image file
/// and the volume name
/// # Params
/// - `image_file_path`: the path of the image file, which must not exist yet
/// - `volume_name`: the name of the volume, cut at 24 bytes
///
/// # Return
/// an [anyhow::Result] type to indicate whether the operation is successful
pub fn mkfs<P>(image_file_path: P, volume_name: &str) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let path = image_file_path.as_ref();
    let fs = SimFS::new(volume_name);
    // never clobber an existing image
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("can't create image file {}", path.display()))?;
    fs.save_image(&mut BufWriter::new(file))
        .with_context(|| format!("can't write image file {}", path.display()))?;
    info!(
        "created filesystem {} in {}",
        fs.superblock().volume_name(),
        path.display()
    );
    Ok(())
}
