pub mod config;
pub mod error;
pub mod organize;
pub mod tmdb;
pub mod video;

pub use error::{Error, Result};
