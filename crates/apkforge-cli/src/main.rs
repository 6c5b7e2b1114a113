//! apkforge - decompile, rebuild, align and sign Android APKs
//!
//! ## Usage
//!
//! - `apkforge d app.apk`: decompile into `output/app-decompiled`
//! - `apkforge c output/app-decompiled`: rebuild, zipalign, then sign
//!   interactively
//!
//! Tool locations come from `apkforge.toml` (or `--config`) and the
//! `APKTOOL_PATH`, `ANDROID_SDK_TOOLS` and `KEYTOOL_PATH` environment
//! variables.

mod terminal;

use anyhow::{Context, Result};
use apkforge_core::{
    init_tracing, open_run_log, Action, Outcome, Pipeline, PipelineContext, PipelineError,
    PipelineResult, ToolConfig,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Level};

use crate::terminal::TerminalPrompter;

#[derive(Parser, Debug)]
#[command(name = "apkforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Decompile, rebuild, zipalign and sign Android APKs", long_about = None)]
struct Cli {
    /// `d` to decompile an APK, `c` to compile a decompiled directory
    #[arg(value_parser = parse_action)]
    action: Action,

    /// APK file (decompile) or decompiled directory (compile)
    input: PathBuf,

    /// Configuration file (default: ./apkforge.toml when present)
    #[arg(long, env = "APKFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,
}

fn parse_action(value: &str) -> std::result::Result<Action, String> {
    value.parse().map_err(|e: PipelineError| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let config = match ToolConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(cli.json, level, None);
            error!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match open_run_log(&config.log_dir) {
        Ok((path, file)) => {
            init_tracing(cli.json, level, Some(file));
            debug!("Logging to {}", path.display());
        }
        Err(e) => {
            init_tracing(cli.json, level, None);
            warn!("Could not open log file in {}: {}", config.log_dir.display(), e);
        }
    }

    match run(cli.action, &cli.input, config).await {
        Ok(result) => {
            report(&result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(action: Action, input: &Path, config: ToolConfig) -> Result<PipelineResult> {
    debug!(?config, "Loaded configuration");
    let ctx = PipelineContext::with_process_runner(config, Arc::new(TerminalPrompter::new()));
    let pipeline = Pipeline::new(ctx);

    pipeline
        .run(action, input)
        .await
        .with_context(|| format!("{} failed for {}", action_name(action), input.display()))
}

fn action_name(action: Action) -> &'static str {
    match action {
        Action::Compile => "compile",
        Action::Decompile => "decompile",
    }
}

fn report(result: &PipelineResult) {
    for stage in &result.stages {
        debug!(
            stage = %stage.stage,
            duration_ms = stage.duration_ms,
            "Stage finished"
        );
    }

    match &result.outcome {
        Outcome::Decompiled { directory } => {
            info!("Decompiled output: {}", directory.display())
        }
        Outcome::Signed(signed) => info!(
            "Signed APK: {} (keystore {})",
            signed.apk.display(),
            signed.keystore.display()
        ),
        Outcome::SigningSkipped { artifact } => {
            info!("Unsigned APK: {}", artifact.display())
        }
    }
    info!("Done in {}ms", result.duration_ms);
}
