pub mod command;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod io;
pub mod launcher;
pub mod paths;

pub use command::BuildCommand;
pub use error::{DocbuildError, Result};
