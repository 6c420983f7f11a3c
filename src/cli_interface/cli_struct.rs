use clap::{Parser, ValueEnum};

use crate::fs::FileKind;

#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about)]
pub enum SimFsCli {
    /// create a new file system
    Mkfs(MkfsArgs),
    /// copy a host file into the root directory of a file system
    Add(AddArgs),
    /// list the root directory of a file system
    Ls(LsArgs),
    /// print everything a file system holds
    Dump(DumpArgs),
}

///make a new fs subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "make a new file system")]
pub struct MkfsArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// the name of the volume, at most 24 bytes are kept
    #[clap(short = 'n', long)]
    pub volume_name: String,
}

/// add a file subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "add a file to a file system")]
pub struct AddArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// the host file to copy in
    #[clap(short, long)]
    pub file: String,
    /// the kind recorded in the new inode
    #[clap(short, long, value_enum, default_value_t = KindArg::Ordinary)]
    pub kind: KindArg,
    /// only keep the first block and don't link it into the root directory
    #[clap(long)]
    pub single_block: bool,
}

/// list subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "list the root directory")]
pub struct LsArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// print number, kind, size and date of every entry
    #[clap(short = 'l', long)]
    pub long: bool,
}

/// dump subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "dump a file system")]
pub struct DumpArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
}

/// [FileKind] as a command line value
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Ordinary,
    Directory,
    Other,
}

impl From<KindArg> for FileKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Ordinary => FileKind::Ordinary,
            KindArg::Directory => FileKind::Directory,
            KindArg::Other => FileKind::Other,
        }
    }
}

/// test the `SimFsCli` struct
/// test `mkfs` subcommand
#[cfg(test)]
mod mkfs_parse_args_tests {
    use super::*;
    /// test short parameter form
    #[test]
    fn test_short_parameter_form() {
        let args = SimFsCli::parse_from(["simfs", "mkfs", "-p", "test", "-n", "Disk"]);
        assert_eq!(
            args,
            SimFsCli::Mkfs(MkfsArgs {
                image_file_path: "test".to_string(),
                volume_name: "Disk".to_string(),
            })
        );
    }
    /// test long parameter form
    #[test]
    fn test_long_parameter_form() {
        let image_file_path_name = concat!("--", "image-file-path");
        let args = SimFsCli::parse_from([
            "simfs",
            "mkfs",
            image_file_path_name,
            "test",
            "--volume-name",
            "Disk",
        ]);
        assert_eq!(
            args,
            SimFsCli::Mkfs(MkfsArgs {
                image_file_path: "test".to_string(),
                volume_name: "Disk".to_string(),
            })
        );
    }
}
