// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log root directory not found: {0}")]
    MissingRoot(PathBuf),

    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("blocking task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;
