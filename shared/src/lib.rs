// shared/src/lib.rs

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read API description {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse API description: {0}")]
    Parse(String),
    #[error("no POST operations with JSON examples found in API description")]
    NoExamples,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("http client: {0}")]
    Http(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
