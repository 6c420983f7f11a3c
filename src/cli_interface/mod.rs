//! the command line interface of `simfs`
mod cli_struct;
pub use cli_struct::*;
