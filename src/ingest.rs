//! copy host files into an image
use crate::fs::{FileKind, SimFS};
use anyhow::Context;
use byte_unit::{Byte, ByteUnit};
use std::path::Path;

/// load the image, ingest `file` into it and save it back
///
/// the image file is only rewritten once the ingestion succeeded
/// # Params
/// - `single_block`: keep only the first block, without a directory entry
pub fn add<P, Q>(
    image_file_path: P,
    file: Q,
    kind: FileKind,
    single_block: bool,
) -> anyhow::Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let image = image_file_path.as_ref();
    let file = file.as_ref();
    let mut fs = SimFS::load_from_file(image)
        .with_context(|| format!("can't load image file {}", image.display()))?;

    if single_block {
        let written = fs
            .ingest_small_file(file, kind)
            .with_context(|| format!("can't add {}", file.display()))?;
        println!(
            "{}: {} stored in inode {}",
            file.display(),
            Byte::from_bytes(written as _).get_adjusted_unit(ByteUnit::B),
            fs.inode_count() - 1
        );
    } else {
        let ingested = fs
            .ingest_file(file, kind)
            .with_context(|| format!("can't add {}", file.display()))?;
        println!(
            "{}: {} stored in inode {}{}",
            file.display(),
            Byte::from_bytes(ingested.written as _).get_adjusted_unit(ByteUnit::B),
            ingested.inode_number,
            if ingested.truncated { " (truncated)" } else { "" }
        );
    }

    fs.save_to_file(image)
        .with_context(|| format!("can't save image file {}", image.display()))?;
    Ok(())
}
