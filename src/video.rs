use sanitize_filename::{Options, sanitize_with_options};
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

use crate::{
    error::{Error, Result},
    tmdb::Episode,
};

pub const MEDIA_EXTENSIONS: [&str; 2] = ["mp4", "mkv"];

pub fn format_episode_label(season: u32, episode: i32) -> String {
    format!("Episode S{:02}E{:02}", season, episode)
}

pub fn season_dir_name(season: u32) -> String {
    format!("Season {:02}", season)
}

/// Longest file name most filesystems accept, in bytes.
const MAX_FILE_NAME_BYTES: usize = 255;

/// Sanitized `title`, shortened on a char boundary so that `reserved` more bytes still fit.
fn fit_title(title: &str, reserved: usize) -> String {
    let title = sanitize_with_options(
        title,
        Options {
            truncate: false,
            ..Options::default()
        },
    );
    let mut end = MAX_FILE_NAME_BYTES.saturating_sub(reserved).min(title.len());
    while !title.is_char_boundary(end) {
        end -= 1;
    }
    title[..end].to_string()
}

pub fn movie_dir_name(title: &str, year: Option<&str>) -> String {
    match year {
        Some(year) => {
            let year = format!(" ({})", year);
            format!("{}{}", fit_title(title, year.len()), year)
        }
        None => fit_title(title, 0),
    }
}

pub fn episode_file_name(season: u32, episode: &Episode, suffix: &str) -> String {
    let label = format!("{}-", format_episode_label(season, episode.episode_number));
    let suffix = format!(".{}", suffix);
    let name = fit_title(&episode.name, label.len() + suffix.len());
    format!("{}{}{}", label, name, suffix)
}

pub fn movie_file_name(title: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) => {
            let suffix = format!(".{}", suffix);
            format!("{}{}", fit_title(title, suffix.len()), suffix)
        }
        None => fit_title(title, 0),
    }
}

/// Lowercased extension of `path` when it is one of the supported media formats.
pub fn parse_extension(path: &Path) -> Option<String> {
    if path.is_dir() {
        return None;
    }

    let ext = path.extension()?.to_str()?.to_lowercase();
    if !MEDIA_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }

    Some(ext)
}

/// Names of the media files directly inside `directory`, sorted by name.
pub fn list_local_media(directory: &Path) -> Result<Vec<String>> {
    if !directory.is_dir() {
        return Err(Error::NotADirectory(directory.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| Error::Io(err.into()))?;
        let path = entry.path();

        if !path.is_file() || parse_extension(path).is_none() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            warn!("Skip {:?}: file name is not valid UTF-8", path);
            continue;
        };
        names.push(name.to_string());
    }

    Ok(names)
}
