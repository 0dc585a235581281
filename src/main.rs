use anyhow::{Result, bail};
use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};
use tmdb_rename::{
    Error,
    config::{Config, DEFAULT_CONFIG_PATH},
    organize::{Report, organize_movie, organize_season},
    tmdb::{Episode, TmdbClient},
    video::list_local_media,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["tv", "movie"])))]
struct Args {
    /// Name of the TV show
    #[arg(long, requires = "season")]
    tv: Option<String>,

    /// Name of the movie
    #[arg(long)]
    movie: Option<String>,

    /// Season of the TV show
    #[arg(long, conflicts_with = "movie")]
    season: Option<u32>,

    /// Directory holding the episodes, or the movie file itself
    #[arg(long)]
    target: PathBuf,

    /// Release year used to narrow the movie search
    #[arg(long, conflicts_with = "tv")]
    year: Option<String>,

    /// INI file with an [api] section
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print the planned moves without touching the filesystem
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "tmdb_rename=debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn log_report(report: Report) {
    info!("Renamed {} file(s), {} failed", report.renamed, report.failed);
}

async fn fetch_episodes(client: &TmdbClient, name: &str, season: u32) -> Vec<Episode> {
    let show_id = match client.find_show_id(name).await {
        Ok(Some(show_id)) => show_id,
        Ok(None) => return Vec::new(),
        Err(err) => {
            error!("Network request error: {}", err);
            return Vec::new();
        }
    };

    client
        .list_episodes(show_id, season)
        .await
        .unwrap_or_else(|err| {
            error!("Get episodes error: {}", err);
            Vec::new()
        })
}

async fn run_tv(
    client: &TmdbClient,
    name: &str,
    season: u32,
    target: &Path,
    dry_run: bool,
) -> Result<()> {
    let episodes = fetch_episodes(client, name, season).await;
    let local_files = list_local_media(target)?;

    match organize_season(target, season, &local_files, &episodes, dry_run) {
        Ok(report) => log_report(report),
        Err(err @ (Error::CountMismatch { .. } | Error::NoMedia(_))) => error!("{}", err),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

async fn run_movie(
    client: &TmdbClient,
    name: &str,
    year: Option<&str>,
    target: &Path,
    dry_run: bool,
) -> Result<()> {
    let movie = match client.find_movie(name, year).await {
        Ok(Some(movie)) => movie,
        Ok(None) => return Ok(()),
        Err(err) => {
            error!("Network request error: {}", err);
            return Ok(());
        }
    };

    log_report(organize_movie(target, &movie, dry_run)?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::load(&args.config)?;
    let client = TmdbClient::new(&config);

    if let Some(movie) = args.movie.as_deref() {
        run_movie(
            &client,
            movie,
            args.year.as_deref(),
            &args.target,
            args.dry_run,
        )
        .await
    } else if let (Some(tv), Some(season)) = (args.tv.as_deref(), args.season) {
        run_tv(&client, tv, season, &args.target, args.dry_run).await
    } else {
        bail!("either --movie or --tv with --season is required")
    }
}
