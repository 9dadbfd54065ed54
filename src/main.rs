use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use menu_structurer::config::DEFAULT_ENV_FILE;
use menu_structurer::{
    DishIdCounter, LayoutProfile, MenuPipeline, OpenAiDisambiguator, Settings,
};

#[derive(Debug, Parser)]
#[command(
    name = "menu-structurer",
    version,
    about = "Turn restaurant menu PDFs into structured dish catalogs"
)]
struct Cli {
    /// Directory scanned (non-recursively) for *.pdf files
    #[arg(long, value_name = "DIR", default_value = ".")]
    input_dir: PathBuf,

    /// Directory receiving complete_<name>_menu.json files
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Env file holding OPENAI_API_KEY
    #[arg(long, value_name = "FILE", default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// JSON layout profile replacing the built-in one
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Chat model override
    #[arg(long)]
    model: Option<String>,

    /// Chat-completions endpoint override
    #[arg(long)]
    endpoint: Option<String>,

    /// Identifier given to the first dish of the run
    #[arg(long, default_value_t = 1)]
    first_dish_id: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("menu_structurer=info".parse()?),
        )
        .init();

    // reqwest may see more than one rustls provider; pin the one we build with.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let started = Local::now();
    debug!("start run");
    let cli = Cli::parse();

    // Fail before touching any document when the key is missing.
    let settings = Settings::load(&cli.env_file).context("loading configuration")?;
    let profile = match &cli.profile {
        Some(path) => LayoutProfile::from_json_file(path)?,
        None => LayoutProfile::default(),
    };
    let oracle = OpenAiDisambiguator::new(
        settings.api_key,
        cli.model.unwrap_or(settings.model),
        cli.endpoint.unwrap_or(settings.endpoint),
    )?;
    info!(model = oracle.model(), "disambiguation client ready");

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating {}", cli.output_dir.display()))?;

    let pipeline = MenuPipeline::with_ids(
        profile,
        Box::new(oracle),
        DishIdCounter::starting_at(cli.first_dish_id),
    );
    let report = pipeline
        .run_batch(&cli.input_dir, &cli.output_dir)
        .await
        .with_context(|| format!("scanning {}", cli.input_dir.display()))?;

    let lead_time = Local::now() - started;
    info!(
        written = report.written.len(),
        failed = report.failed.len(),
        lead_time_ms = lead_time.num_milliseconds(),
        "finished run"
    );
    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        for (path, err) in &report.failed {
            warn!(path = %path.display(), error = %err, "document failed");
        }
        Ok(ExitCode::FAILURE)
    }
}
