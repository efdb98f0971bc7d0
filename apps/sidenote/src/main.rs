use std::io::Read;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sidenote::config::Config;
use sidenote::document::{plan_document, PanelSettings, SourcePage};
use sidenote::errors::AppError;
use sidenote::state::AppState;

/// Planning request read from stdin.
#[derive(Debug, Deserialize)]
struct PlanRequest {
    #[serde(default)]
    settings: Option<PanelSettings>,
    pages: Vec<SourcePage>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparsable env vars)
    let config = Config::from_env()?;

    // Initialize structured logging. Logs go to stderr; stdout carries the plan.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting sidenote v{}", env!("CARGO_PKG_VERSION"));
    info!(
        max_depth = config.tuning.max_depth,
        safety_factor = config.tuning.safety_factor,
        workers = config.worker_concurrency,
        "Pagination engine configured"
    );

    let blank_min_chars = config.blank_min_chars;
    let state = AppState::from_config(config)?;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read planning request from stdin")?;
    let request: PlanRequest =
        serde_json::from_str(&input).context("Planning request is not valid JSON")?;

    // Requests without settings get the defaults plus the environment's blank threshold.
    let settings = request.settings.unwrap_or(PanelSettings {
        blank_min_chars,
        ..PanelSettings::default()
    });

    match plan_document(&state.pool, &settings, &request.pages).await {
        Ok(plan) => {
            info!(
                source_pages = plan.pages.len(),
                output_pages = plan.output_page_count,
                truncated = plan.truncated_pages.len(),
                "Document planned"
            );
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", e.to_json());
            Err(exit_error(e))
        }
    }
}

fn exit_error(e: AppError) -> anyhow::Error {
    anyhow::Error::new(e).context("Document planning failed")
}
