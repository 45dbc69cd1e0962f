//! reelmeta - TMDB movie, TV and people metadata CLI.

/// Application configuration (TOML).
mod config;

use std::fmt::Display;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use reelmeta_api::Tmdb;
use reelmeta_api::coerce::FromCoerced;
use reelmeta_api::paged::{Envelope, PagedResult};
use reelmeta_api::tmdb::{SearchOptions, TimeWindow, TrendingMedia};
use reelmeta_api::transport::TmdbClient;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, resolve_config_path};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show movie details.
    Movie(IdArgs),
    /// Show TV show details.
    Tv(IdArgs),
    /// Show person details.
    Person(IdArgs),
    /// Search TMDB.
    Search(SearchCommand),
    /// List trending titles and people.
    Trending(TrendingArgs),
    /// Inspect or change the local configuration.
    Config(ConfigCommand),
}

/// Arguments of the detail subcommands.
#[derive(clap::Args)]
struct IdArgs {
    /// TMDB id.
    #[arg(long, required = true)]
    id: u64,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchCommand {
    /// Search subcommand to run.
    #[command(subcommand)]
    command: SearchSubcommands,
}

/// Available search subcommands.
#[derive(Subcommand)]
enum SearchSubcommands {
    /// Search movies.
    Movie(SearchArgs),
    /// Search TV shows.
    Tv(SearchArgs),
    /// Search movies, TV shows and people at once.
    Multi(SearchArgs),
}

/// Arguments of the search subcommands.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "The Matrix").
    #[arg(long, required = true)]
    query: String,
    /// Maximum number of results, fetched across pages.
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

/// Arguments for the `trending` subcommand.
#[derive(clap::Args)]
struct TrendingArgs {
    /// Media filter: all, movie, tv or person.
    #[arg(long, default_value = "all")]
    media: String,
    /// Time window: day or week.
    #[arg(long, default_value = "day")]
    window: String,
    /// Maximum number of results, fetched across pages.
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Print the current configuration.
    Show,
    /// Update configuration values.
    Set(ConfigSetArgs),
}

/// Arguments for the `config set` subcommand.
#[derive(clap::Args)]
struct ConfigSetArgs {
    /// Request language (e.g. "en-US").
    #[arg(long)]
    language: Option<String>,
    /// Default region (ISO 3166-1, e.g. "GB").
    #[arg(long)]
    region: Option<String>,
    /// Image languages, comma separated (e.g. "en,null").
    #[arg(long)]
    image_language: Option<String>,
}

/// Builds a `TmdbClient` from the `TMDB_*` environment variables.
///
/// `TMDB_API_KEY` is required; `TMDB_V4_TOKEN`, `TMDB_V4_ACCOUNT_ID` and
/// `TMDB_SESSION_ID` are optional.
///
/// # Errors
///
/// Returns an error if `TMDB_API_KEY` is not set or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client() -> Result<TmdbClient> {
    let api_key =
        std::env::var("TMDB_API_KEY").context("TMDB_API_KEY environment variable is required")?;

    let mut builder = TmdbClient::builder().api_key(api_key).user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Ok(token) = std::env::var("TMDB_V4_TOKEN") {
        builder = builder.v4_access_token(token);
    }
    if let Ok(account_id) = std::env::var("TMDB_V4_ACCOUNT_ID") {
        builder = builder.v4_account_id(account_id);
    }
    if let Ok(session_id) = std::env::var("TMDB_SESSION_ID") {
        builder = builder.session_id(session_id);
    }
    builder.build().context("failed to build TMDB client")
}

/// Connects to TMDB with the configured request defaults.
///
/// # Errors
///
/// Returns an error if the config cannot be read, the client fails to
/// build, or the configuration tables fail to load.
#[instrument(skip_all)]
async fn connect(dir: Option<&PathBuf>) -> Result<(Tmdb<TmdbClient>, AppConfig)> {
    let config = AppConfig::load(&resolve_config_path(dir)?)?;
    let client = build_tmdb_client()?;

    let mut builder = Tmdb::builder(client);
    if let Some(language) = &config.tmdb.language {
        builder = builder.language(language.as_str());
    }
    if let Some(languages) = &config.tmdb.include_image_language {
        builder = builder.include_image_language(languages.as_str());
    }
    let tmdb = builder.connect().await.context("failed to connect to TMDB")?;
    tracing::debug!(language = tmdb.context().language(), "connected");
    Ok((tmdb, config))
}

/// Logs up to `limit` results, walking pages as needed.
///
/// # Errors
///
/// Returns an error if a page request fails.
async fn print_results<V, X>(
    tmdb: &Tmdb<TmdbClient>,
    mut results: PagedResult<V, X>,
    limit: usize,
) -> Result<()>
where
    V: FromCoerced + Display,
    X: Envelope,
{
    tracing::info!("Total results: {}", results.total_results());
    let items = results
        .get_results(tmdb, limit)
        .await
        .context("TMDB page request failed")?;
    for item in items {
        tracing::info!("{item}");
    }
    Ok(())
}

fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| String::from("-"), |v| v.to_string())
}

/// Runs the `movie` subcommand.
///
/// # Errors
///
/// Returns an error if connecting or the API request fails.
#[instrument(skip_all)]
async fn run_movie(args: &IdArgs, dir: Option<&PathBuf>) -> Result<()> {
    let (tmdb, _) = connect(dir).await?;
    let movie = tmdb
        .movie(args.id, true)
        .await
        .context("TMDB movie request failed")?;
    let data = movie.peek();

    let genres: Vec<&str> = data.genres.iter().filter_map(|g| g.name.as_deref()).collect();
    tracing::info!("{movie}");
    tracing::info!("Title: {}", or_dash(data.title.as_deref()));
    tracing::info!("Original Title: {}", or_dash(data.original_title.as_deref()));
    tracing::info!("Tagline: {}", or_dash(data.tagline.as_deref()));
    tracing::info!("Release Date: {}", or_dash(data.release_date));
    tracing::info!("Runtime: {}min", data.runtime);
    tracing::info!("Genres: {}", genres.join(", "));
    tracing::info!("Status: {}", or_dash(data.status.as_deref()));
    tracing::info!("Rating: {:.1}", data.vote_average);
    tracing::info!("Overview: {}", or_dash(data.overview.as_deref()));

    Ok(())
}

/// Runs the `tv` subcommand.
///
/// # Errors
///
/// Returns an error if connecting or the API request fails.
#[instrument(skip_all)]
async fn run_tv(args: &IdArgs, dir: Option<&PathBuf>) -> Result<()> {
    let (tmdb, _) = connect(dir).await?;
    let show = tmdb
        .tv_show(args.id, true)
        .await
        .context("TMDB tv request failed")?;
    let data = show.peek();

    tracing::info!("{show}");
    tracing::info!("Name: {}", or_dash(data.name.as_deref()));
    tracing::info!("Original Name: {}", or_dash(data.original_name.as_deref()));
    tracing::info!("First Air Date: {}", or_dash(data.first_air_date));
    tracing::info!("Status: {}", or_dash(data.status.as_deref()));
    tracing::info!("Seasons: {}", data.number_of_seasons);
    tracing::info!("Episodes: {}", data.number_of_episodes);
    tracing::info!("---");
    for season in &data.seasons {
        let season = season.peek();
        tracing::info!(
            "  Season {}: {} (air_date: {})",
            season.season_number,
            or_dash(season.name.as_deref()),
            or_dash(season.air_date),
        );
    }

    Ok(())
}

/// Runs the `person` subcommand.
///
/// # Errors
///
/// Returns an error if connecting or the API request fails.
#[instrument(skip_all)]
async fn run_person(args: &IdArgs, dir: Option<&PathBuf>) -> Result<()> {
    let (tmdb, _) = connect(dir).await?;
    let person = tmdb
        .person(args.id, true)
        .await
        .context("TMDB person request failed")?;
    let data = person.peek();

    tracing::info!("{person}");
    tracing::info!("Name: {}", or_dash(data.name.as_deref()));
    tracing::info!("Known For: {}", or_dash(data.known_for_department.as_deref()));
    tracing::info!("Born: {}", or_dash(data.birthday));
    if let Some(deathday) = data.deathday {
        tracing::info!("Died: {deathday}");
    }
    tracing::info!("Place of Birth: {}", or_dash(data.place_of_birth.as_deref()));
    tracing::info!("Biography: {}", or_dash(data.biography.as_deref()));

    Ok(())
}

/// Runs the `search` subcommands.
///
/// # Errors
///
/// Returns an error if `--limit` is zero, connecting fails, or the search
/// finds nothing.
#[instrument(skip_all)]
async fn run_search(command: &SearchSubcommands, dir: Option<&PathBuf>) -> Result<()> {
    let args = match command {
        SearchSubcommands::Movie(args)
        | SearchSubcommands::Tv(args)
        | SearchSubcommands::Multi(args) => args,
    };
    if args.limit == 0 {
        bail!("--limit must be greater than 0");
    }

    let (tmdb, config) = connect(dir).await?;
    let options = SearchOptions {
        region: config.tmdb.region,
        ..SearchOptions::default()
    };
    match command {
        SearchSubcommands::Movie(_) => {
            let results = tmdb
                .movie_search(&args.query, &options)
                .await
                .context("TMDB search/movie request failed")?;
            print_results(&tmdb, results, args.limit).await
        }
        SearchSubcommands::Tv(_) => {
            let results = tmdb
                .tv_search(&args.query, &options)
                .await
                .context("TMDB search/tv request failed")?;
            print_results(&tmdb, results, args.limit).await
        }
        SearchSubcommands::Multi(_) => {
            let results = tmdb
                .multi_search(&args.query, &options)
                .await
                .context("TMDB search/multi request failed")?;
            print_results(&tmdb, results, args.limit).await
        }
    }
}

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if the media or window is unknown, connecting fails,
/// or the API request fails.
#[instrument(skip_all)]
async fn run_trending(args: &TrendingArgs, dir: Option<&PathBuf>) -> Result<()> {
    let media: TrendingMedia = args.media.parse()?;
    let window: TimeWindow = args.window.parse()?;
    if args.limit == 0 {
        bail!("--limit must be greater than 0");
    }

    let (tmdb, _) = connect(dir).await?;
    let results = tmdb
        .trending(media, window)
        .await
        .context("TMDB trending request failed")?;
    print_results(&tmdb, results, args.limit).await
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be read.
fn run_config_show(dir: Option<&PathBuf>) -> Result<()> {
    let path = resolve_config_path(dir)?;
    let config = AppConfig::load(&path)?;

    tracing::info!("# {}", path.display());
    for line in config.to_toml()?.lines() {
        tracing::info!("{line}");
    }
    Ok(())
}

/// Runs the `config set` subcommand.
///
/// # Errors
///
/// Returns an error if no value is given, a value is malformed, or the
/// config cannot be written.
fn run_config_set(args: &ConfigSetArgs, dir: Option<&PathBuf>) -> Result<()> {
    if args.language.is_none() && args.region.is_none() && args.image_language.is_none() {
        bail!("nothing to set: pass --language, --region or --image-language");
    }

    let path = resolve_config_path(dir)?;
    let mut config = AppConfig::load(&path)?;
    if let Some(language) = &args.language {
        config.set_language(language)?;
    }
    if let Some(region) = &args.region {
        config.set_region(region)?;
    }
    if let Some(languages) = &args.image_language {
        config.set_image_languages(languages)?;
    }
    config.save(&path)?;

    tracing::info!("Saved {}", path.display());
    Ok(())
}

/// Installs the global subscriber: fmt output filtered by `RUST_LOG`
/// (default `info`), plus OTLP span export when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set and the `otel` feature is on.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(not(feature = "otel"))]
    fmt().with_env_filter(env_filter).with_target(false).init();

    #[cfg(feature = "otel")]
    {
        let otel_layer = std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT").and_then(|_| {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .build()
                .ok()?;
            let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                .with_simple_exporter(exporter)
                .build();
            let tracer =
                opentelemetry::trace::TracerProvider::tracer(&tracer_provider, env!("CARGO_PKG_NAME"));
            opentelemetry::global::set_tracer_provider(tracer_provider);
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .with(otel_layer)
            .init();
    }
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let dir = cli.dir.as_ref();
    match cli.command {
        Commands::Movie(args) => run_movie(&args, dir).await,
        Commands::Tv(args) => run_tv(&args, dir).await,
        Commands::Person(args) => run_person(&args, dir).await,
        Commands::Search(search) => run_search(&search.command, dir).await,
        Commands::Trending(args) => run_trending(&args, dir).await,
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Show => run_config_show(dir),
            ConfigSubcommands::Set(args) => run_config_set(&args, dir),
        },
    }
}
