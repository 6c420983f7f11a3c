use std::fmt;

use serde::{Deserialize, Serialize};

/// an enum to describe the type of a file
///
/// persisted as its variant index, so the order of variants is part of the image format
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum FileKind {
    /// an ordinary file
    #[default]
    Ordinary,
    /// a directory
    Directory,
    /// anything else
    Other,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Ordinary => "ORDINARY",
            FileKind::Directory => "DIRECTORY",
            FileKind::Other => "OTHER",
        };
        // pad so detailed listings line up
        f.pad(name)
    }
}
