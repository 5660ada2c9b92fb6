pub mod aggregate;
pub mod changelog;
pub mod ci;
pub mod config;
pub mod emit;
pub mod error;
pub mod frontmatter;
pub mod hooks;
pub mod io;
pub mod manifest;
pub mod metadata;
pub mod migrate;
pub mod paths;

pub use error::{OrkitError, Result};
