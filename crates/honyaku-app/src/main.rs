use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use honyaku_config::Config;
use honyaku_ocr::{ScreenCapturer, TextExtractor};
use honyaku_translator::{OllamaTranslator, Translator, pick_model};
use honyaku_types::ScreenBounds;
use tokio::signal;
use tracing_subscriber::EnvFilter;

mod cli;
mod controller;
mod io;
mod overlay;
mod pipeline;
mod scheduler;
mod status;

#[cfg(test)]
mod tests;

use self::cli::{Args, COMMAND_HELP};
use self::controller::AppController;
use self::pipeline::Pipeline;
use self::scheduler::{DisplayInfo, Scheduler, SchedulerCommand};

const FALLBACK_SCREEN: ScreenBounds = ScreenBounds {
    width: 1920,
    height: 1080,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::new();
    args.apply(&mut config);
    tracing::debug!("Config: {:?}", config);

    let translator = Arc::new(
        OllamaTranslator::new(&config.translator).context("Failed to build HTTP client")?,
    );

    if args.list_models {
        let models = translator
            .list_models()
            .await
            .context("Failed to list models")?;
        for model in models {
            println!("{model}");
        }
        return Ok(());
    }

    let model = match translator.list_models().await {
        Ok(models) => {
            tracing::info!("Available models: {:?}", models);
            pick_model(&models, &config.translator.model)
        }
        Err(e) => {
            tracing::error!("Failed to list models: {}", e);
            config.translator.model.clone()
        }
    };
    tracing::info!("Using model {}", model);

    let display_info = detect_displays(&config);
    tracing::info!(
        "DPI scale {:.2}, screen {}x{}, {} display(s)",
        display_info.dpi_scale,
        display_info.screen.width,
        display_info.screen.height,
        display_info.displays.len()
    );

    config.ocr.engine = honyaku_ocr::resolve_engine(config.ocr.engine);
    let ocr_config = config.ocr.clone();
    let extractor = tokio::task::spawn_blocking(move || TextExtractor::new(ocr_config))
        .await
        .context("OCR loader crashed")?
        .with_context(|| {
            let hint = if honyaku_ocr::available_engines().is_empty() {
                " (no OCR engine in this build, rebuild with `--features paddle`)"
            } else {
                ""
            };
            format!(
                "Cannot start {} OCR for {}{}",
                config.ocr.engine, config.ocr.language, hint
            )
        })?;

    let controller = AppController::new();
    let presenter = controller.presenter();

    let pipeline = Pipeline::new(
        Arc::new(ScreenCapturer),
        extractor,
        translator,
        presenter.clone(),
        config.translator.target_language,
        model,
    );
    let scheduler = Scheduler::new(
        pipeline,
        presenter,
        display_info,
        Duration::from_millis(config.capture_interval_ms),
        config.scale_percent,
    );

    let commands = controller.command_sender();
    if let Some(rect) = args.selection() {
        commands.send(SchedulerCommand::Select(rect)).await?;
        if args.start {
            commands.send(SchedulerCommand::Start).await?;
        }
    } else if args.start {
        tracing::warn!("--start needs --left/--top/--width/--height");
    }

    let mut tasks = controller.spawn_tasks(scheduler);
    tracing::info!("{}", COMMAND_HELP);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::info!("Task finished, shutting down"),
                Ok(Err(e)) => tracing::error!("Task failed: {e:#}"),
                Err(e) => tracing::error!("Task panicked: {e}"),
            }
        }
    }

    controller.shutdown();
    if tokio::time::timeout(Duration::from_secs(2), async {
        while tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        tasks.abort_all();
    }

    // A pending stdin read cannot be cancelled and would keep the runtime alive
    std::process::exit(0);
}

/// Display scale and layout, with fallbacks so a headless session still starts
fn detect_displays(config: &Config) -> DisplayInfo {
    let dpi_scale = config.dpi_scale.unwrap_or_else(|| {
        honyaku_ocr::primary_scale_factor().unwrap_or_else(|e| {
            tracing::warn!("Cannot read display scale, assuming 1.0: {e:#}");
            1.0
        })
    });

    let screen = honyaku_ocr::primary_screen_bounds().unwrap_or_else(|e| {
        tracing::warn!("Cannot read screen size, assuming {:?}: {e:#}", FALLBACK_SCREEN);
        FALLBACK_SCREEN
    });

    let displays = honyaku_ocr::display_regions().unwrap_or_else(|e| {
        tracing::warn!("Cannot enumerate displays: {}", e);
        Vec::new()
    });

    DisplayInfo {
        dpi_scale,
        screen,
        displays,
    }
}
