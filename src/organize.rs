use colored::Colorize;
use std::{
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, error, warn};

use crate::{
    error::{Error, Result},
    tmdb::{Episode, MovieMatch},
    video::{episode_file_name, movie_dir_name, movie_file_name, season_dir_name},
};

/// Outcome of a rename batch. Failed moves are logged and counted, never propagated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub renamed: usize,
    pub failed: usize,
}

fn create_dir_once(path: &Path) -> Result<()> {
    match fs::create_dir(path) {
        Ok(()) => {
            debug!("Created {:?}", path);
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            warn!("Target dir {:?} already exists", path);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Directory that receives the movie folder: the parent of the folder holding `target_file`.
/// A file directly under the filesystem root falls back to the root itself.
pub fn movie_root(target_file: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(target_file)?;
    absolute
        .parent()
        .map(|parent| parent.parent().unwrap_or(parent).to_path_buf())
        .ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{:?} has no grandparent directory", target_file),
            ))
        })
}

/// Create `Season NN` inside `target_dir` unless it already exists.
pub fn create_season_dir(target_dir: &Path, season: u32) -> Result<String> {
    if !target_dir.is_dir() {
        return Err(Error::NotADirectory(target_dir.to_path_buf()));
    }

    let name = season_dir_name(season);
    create_dir_once(&target_dir.join(&name))?;
    Ok(name)
}

/// Create `Title (Year)` next to the folder that holds `target_file`.
pub fn create_movie_dir(target_file: &Path, title: &str, year: Option<&str>) -> Result<String> {
    if !target_file.is_file() {
        return Err(Error::NotAFile(target_file.to_path_buf()));
    }

    let name = movie_dir_name(title, year);
    create_dir_once(&movie_root(target_file)?.join(&name))?;
    Ok(name)
}

fn move_file(source: &Path, destination: &Path) -> Result<()> {
    if destination.exists() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{:?} already exists", destination),
        )));
    }
    fs::rename(source, destination)?;
    Ok(())
}

pub fn rename_episode(
    target_dir: &Path,
    season_dir: &str,
    source_name: &str,
    destination_name: &str,
) -> Result<()> {
    move_file(
        &target_dir.join(source_name),
        &target_dir.join(season_dir).join(destination_name),
    )
}

pub fn rename_movie(target_file: &Path, movie_dir: &str, destination_name: &str) -> Result<()> {
    move_file(
        target_file,
        &movie_root(target_file)?.join(movie_dir).join(destination_name),
    )
}

/// Pair the i-th local file with the i-th episode. File names play no part in the match.
pub fn pair_episodes(
    local_files: &[String],
    episodes: &[Episode],
    season: u32,
    suffix: &str,
) -> Result<Vec<(String, String)>> {
    if local_files.len() != episodes.len() {
        return Err(Error::CountMismatch {
            local: local_files.len(),
            remote: episodes.len(),
        });
    }

    Ok(local_files
        .iter()
        .zip(episodes)
        .map(|(local, episode)| (local.clone(), episode_file_name(season, episode, suffix)))
        .collect())
}

/// Move a sorted batch of local episodes into `Season NN` under `target_dir`.
///
/// Every file takes the extension of the first one. The season directory is
/// created before the counts are compared, so a mismatch leaves it empty.
pub fn organize_season(
    target_dir: &Path,
    season: u32,
    local_files: &[String],
    episodes: &[Episode],
    dry_run: bool,
) -> Result<Report> {
    let Some(first) = local_files.first() else {
        return Err(Error::NoMedia(target_dir.to_path_buf()));
    };
    let suffix = Path::new(first)
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or_default();

    let season_dir = if dry_run {
        season_dir_name(season)
    } else {
        create_season_dir(target_dir, season)?
    };

    let pairs = pair_episodes(local_files, episodes, season, suffix)?;

    let mut report = Report::default();
    for (old, new) in pairs {
        let shown = Path::new(&season_dir).join(&new);
        println!("{} -> {}", old, shown.display().to_string().cyan());
        if dry_run {
            continue;
        }
        match rename_episode(target_dir, &season_dir, &old, &new) {
            Ok(()) => report.renamed += 1,
            Err(err) => {
                error!("Error occurred while renaming {:?}: {}", old, err);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Move a single movie file into `Title (Year)` beside its current folder.
pub fn organize_movie(target_file: &Path, movie: &MovieMatch, dry_run: bool) -> Result<Report> {
    if !target_file.is_file() {
        return Err(Error::NotAFile(target_file.to_path_buf()));
    }

    let movie_dir = if dry_run {
        movie_dir_name(&movie.title, movie.year.as_deref())
    } else {
        create_movie_dir(target_file, &movie.title, movie.year.as_deref())?
    };

    let suffix = target_file.extension().and_then(OsStr::to_str);
    let new = movie_file_name(&movie.title, suffix);
    println!(
        "{} -> {}",
        target_file.display(),
        Path::new(&movie_dir).join(&new).display().to_string().cyan()
    );

    let mut report = Report::default();
    if dry_run {
        return Ok(report);
    }
    match rename_movie(target_file, &movie_dir, &new) {
        Ok(()) => report.renamed += 1,
        Err(err) => {
            error!("Error occurred while renaming movie {:?}: {}", target_file, err);
            report.failed += 1;
        }
    }

    Ok(report)
}
