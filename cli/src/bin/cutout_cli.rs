use clap::{Parser, Subcommand};
use clap::builder::PossibleValuesParser;
use cli::{
    export_request, write_archive_file, write_directory, CliConfig, ConfigOverrides,
    DEFAULT_ARCHIVE_NAME,
};
use color_eyre::eyre::{Result, WrapErr};
use cutout::{
    AreaMethod, BackgroundMode, CutoutConfig, DirectoryStore, ExportRequest, ExtractionSession,
    ObjectSummary, TransparencyMode,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pipeline configuration file (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding extracted crops [default: ./temp]
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every object from a scanned image into the store
    Extract {
        /// Path to the input image
        #[arg(short, long)]
        input: PathBuf,
        /// Luminance above which pixels count as paper
        #[arg(long)]
        threshold: Option<u8>,
        /// Smallest object area in pixels
        #[arg(long)]
        min_area: Option<u64>,
        /// How the minimum area is measured
        #[arg(long)]
        area_method: Option<AreaMethod>,
    },
    /// Export stored objects with the chosen background
    Export {
        /// Object ids to export (comma separated); all objects when omitted
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        /// Background treatment
        #[arg(
            long,
            default_value_t = BackgroundMode::Transparent.to_string(),
            value_parser = PossibleValuesParser::new(BackgroundMode::names().iter().copied()),
        )]
        bg: String,
        /// Fill colour for the custom background, as #rrggbb [default: #FFFFFF]
        #[arg(long)]
        color: Option<String>,
        /// Clear paper inside each box instead of keeping it opaque
        #[arg(long)]
        transparency: Option<TransparencyMode>,
        /// Write a zip archive instead of separate files
        #[arg(long, conflicts_with = "out_dir")]
        zip: Option<PathBuf>,
        /// Directory for separate PNG files
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// List the objects currently in the store
    List,
    /// Print the JSON schemas of the config file and object summaries
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => CliConfig::from_file(path)
            .wrap_err_with(|| format!("Failed to load config {}", path.display()))?,
        None => CliConfig::default(),
    };

    let overrides = match &cli.command {
        Commands::Extract { threshold, min_area, area_method, .. } => ConfigOverrides {
            threshold: *threshold,
            min_area: *min_area,
            area_method: *area_method,
            ..Default::default()
        },
        Commands::Export { transparency, .. } => ConfigOverrides {
            transparency: *transparency,
            ..Default::default()
        },
        Commands::List | Commands::Schema => ConfigOverrides::default(),
    };
    let (store_dir, config) = file_config.resolve(cli.store, &overrides);

    match cli.command {
        Commands::Extract { input, .. } => {
            extract(&input, &store_dir, &config)?;
        }
        Commands::Export { ids, bg, color, zip, out_dir, .. } => {
            let request = export_request(ids, &bg, color)?;
            export(&store_dir, &config, &request, zip, out_dir)?;
        }
        Commands::List => {
            let session = open_session(&store_dir, &config)?;
            print_summaries(&session.list()?)?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&CliConfig::schema())?);
            println!("{}", serde_json::to_string_pretty(&schemars::schema_for!(ObjectSummary))?);
        }
    }

    Ok(())
}

fn open_session(store_dir: &Path, config: &CutoutConfig) -> Result<ExtractionSession<DirectoryStore>> {
    let store = DirectoryStore::create(store_dir)
        .wrap_err_with(|| format!("Failed to open store {}", store_dir.display()))?;
    Ok(ExtractionSession::with_config(store, config))
}

fn print_summaries(summaries: &[ObjectSummary]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "objects": summaries }))?);
    Ok(())
}

fn extract(input: &Path, store_dir: &Path, config: &CutoutConfig) -> Result<()> {
    let bytes = std::fs::read(input)
        .wrap_err_with(|| format!("Failed to read {}", input.display()))?;
    info!(
        input = %input.display(),
        threshold = config.segmentation.threshold,
        min_area = config.segmentation.min_area,
        "Extracting objects"
    );

    let session = open_session(store_dir, config)?;
    let summaries = session.extract(&bytes)?;
    if summaries.is_empty() {
        warn!("No objects found in {}", input.display());
    }
    print_summaries(&summaries)?;

    info!("Stored {} objects in {}", summaries.len(), store_dir.display());
    Ok(())
}

fn export(
    store_dir: &Path,
    config: &CutoutConfig,
    request: &ExportRequest,
    zip: Option<PathBuf>,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let session = open_session(store_dir, config)?;
    let rendered = session.export(request)?;
    if rendered.is_empty() {
        warn!("Nothing to export from {}", store_dir.display());
        return Ok(());
    }

    match (zip, out_dir) {
        (_, Some(dir)) => {
            let paths = write_directory(&dir, &rendered)?;
            info!("Wrote {} files to {}", paths.len(), dir.display());
        }
        (zip, None) => {
            let path = zip.unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_NAME));
            write_archive_file(&path, &rendered)?;
            info!("Wrote {} objects to {}", rendered.len(), path.display());
        }
    }
    Ok(())
}
