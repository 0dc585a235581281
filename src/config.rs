use ini::Ini;
use std::{env, path::Path};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.ini";
pub const DEFAULT_LANGUAGE: &str = "zh-CN";
pub const API_KEY_ENV: &str = "TMDB_API_KEY";
pub const API_KEY_LEN: usize = 32;

const API_SECTION: &str = "api";

/// Credentials and locale for the TMDB client, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub language: String,
}

impl Config {
    /// Load `[api]` from the INI file at `path`. `TMDB_API_KEY` in the environment
    /// (or a `.env` file already loaded by the caller) overrides `api_key`.
    pub fn load(path: &Path) -> Result<Self> {
        Self::resolve(path, env::var(API_KEY_ENV).ok())
    }

    fn resolve(path: &Path, key_override: Option<String>) -> Result<Self> {
        let ini = match Ini::load_from_file(path) {
            Ok(ini) => Some(ini),
            Err(err) if key_override.is_some() => {
                debug!("Ignoring unreadable config {:?}: {}", path, err);
                None
            }
            Err(err) => {
                return Err(Error::Config(format!(
                    "unable to read {}: {}",
                    path.display(),
                    err
                )));
            }
        };
        let section = ini.as_ref().and_then(|ini| ini.section(Some(API_SECTION)));

        let api_key = match key_override {
            Some(key) => key,
            None => section
                .and_then(|section| section.get("api_key"))
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::Config(format!(
                        "missing api_key in [{}] of {}",
                        API_SECTION,
                        path.display()
                    ))
                })?,
        };

        if api_key.chars().count() != API_KEY_LEN {
            return Err(Error::Config(format!(
                "please check the api key, expected {} characters but got {}",
                API_KEY_LEN,
                api_key.chars().count()
            )));
        }

        let language = section
            .and_then(|section| section.get("language"))
            .filter(|language| !language.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();

        Ok(Self { api_key, language })
    }
}
