use clap::Parser;
use simfs::cli_interface::SimFsCli;
use std::io;
/// a CLI interface to users to create our filesystem image,
/// copy host files into it, and inspect it.
///
/// Every subcommand loads the image, works on it in memory,
/// and saves it back when it changed.
fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_nanos().init();
    let args = SimFsCli::parse();
    match args {
        SimFsCli::Mkfs(args) => {
            //create a new file system
            simfs::mkfs::mkfs(args.image_file_path, &args.volume_name)?;
        }
        SimFsCli::Add(args) => {
            simfs::ingest::add(
                args.image_file_path,
                args.file,
                args.kind.into(),
                args.single_block,
            )?;
        }
        SimFsCli::Ls(args) => {
            simfs::list::ls(args.image_file_path, args.long, &mut io::stdout().lock())?;
        }
        SimFsCli::Dump(args) => {
            simfs::list::dump(args.image_file_path, &mut io::stdout().lock())?;
        }
    }
    Ok(())
}
