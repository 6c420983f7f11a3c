pub mod cli_interface;
pub mod fs;
pub mod ingest;
pub mod list;
pub mod mkfs;
pub mod utils;
pub use fs::*;
