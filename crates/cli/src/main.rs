mod args;
mod inputs;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ncmconv_core::{
    load_config, load_default_config, validate_config, BatchCoordinator, BatchEvent, BatchSummary,
    Config, ConversionUnit, FfmpegTranscoder, Id3Tagger, NcmDecoder, Transcoder,
};

use args::Args;

/// Config file picked up from the working directory when nothing else is given
const DEFAULT_CONFIG_FILE: &str = "ncmconv.toml";

/// Environment variable naming the config file
const CONFIG_ENV: &str = "NCMCONV_CONFIG";

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.json);

    match run(args).await {
        Ok(summary) if summary.failed == 0 => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the per-file report
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

async fn run(args: Args) -> Result<BatchSummary> {
    let config = resolve_config(&args)?;
    let format = config.output.format;

    let inputs = inputs::collect_jobs(&args.paths, format);
    if inputs.jobs.is_empty() {
        bail!("No convertible .ncm files among the given paths");
    }
    info!(
        jobs = inputs.jobs.len(),
        skipped = inputs.rejected.len(),
        format = %format,
        "Inputs collected"
    );

    let transcoder = Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    if format.needs_transcode() {
        transcoder.validate().await.with_context(|| {
            format!(
                "ffmpeg is required for {} output (tried {:?})",
                format, config.transcoder.ffmpeg_path
            )
        })?;
    }

    let unit = ConversionUnit::new(
        Arc::new(NcmDecoder::new()),
        transcoder,
        Arc::new(Id3Tagger::new()),
    );
    let coordinator = BatchCoordinator::new(config.processor.clone(), unit);
    let mut handle = coordinator.start(inputs.jobs);

    let cancel = handle.cancel_flag();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, remaining files will be skipped");
            cancel.cancel();
        }
    });

    let mut summary = None;
    while let Some(event) = handle.next_event().await {
        match event {
            BatchEvent::Result { result } => println!("{}", report::format_result(&result)),
            BatchEvent::Completed { summary: done } => {
                println!("{}", report::format_summary(&done, inputs.rejected.len()));
                summary = Some(done);
            }
        }
    }

    summary.ok_or_else(|| anyhow!("Batch ended without reporting completion"))
}

/// Loads configuration from `--config`, then `$NCMCONV_CONFIG`, then
/// `./ncmconv.toml`, falling back to defaults. Flags override file values.
fn resolve_config(args: &Args) -> Result<Config> {
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .or_else(|| {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.exists().then_some(local)
        });

    let mut config = match &config_path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => load_default_config().context("Failed to read configuration from environment")?,
    };

    args.apply(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}
