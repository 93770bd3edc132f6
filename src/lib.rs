pub mod cli;
pub mod compress;
pub mod config;
pub mod convert;
pub mod detect;
pub mod error;
pub mod fsops;
pub mod load_config;
pub mod report;

pub use cli::{run, Cli};
pub use compress::Compressor;
pub use error::CompressError;
pub use report::{CompressReport, FileAction};
