use std::{io, path::PathBuf};
use thiserror::Error;

/// Everything that can go wrong between reading the config and renaming the last file.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed configuration. Fatal before any other I/O.
    #[error("config error: {0}")]
    Config(String),

    /// Network failure, non-success status or undecodable JSON from TMDB.
    #[error("request to TMDB failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("target is not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("target is not a file: {0:?}")]
    NotAFile(PathBuf),

    #[error("no mp4 or mkv files found in {0:?}")]
    NoMedia(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Local files and remote episodes cannot be paired one to one.
    #[error("found {local} local episodes but TMDB lists {remote}, check the information")]
    CountMismatch { local: usize, remote: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
