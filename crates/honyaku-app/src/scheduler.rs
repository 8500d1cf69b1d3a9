use std::sync::Arc;
use std::time::Duration;

use honyaku_config::ocr::OcrConfig;
use honyaku_core::{
    SelectionError, compute_overlay_layout, map_selection_to_region, validate_selection,
};
use honyaku_types::{
    CaptureRegion, LogicalRect, OcrEngineKind, OverlayLayout, ScaleFactor, ScreenBounds,
    SourceLanguage, TargetLanguage,
};
use kanal::AsyncReceiver;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::overlay::OverlayPresenter;
use crate::pipeline::{Pipeline, TickOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// A mapped selection. Kept across start/stop, replaced on the next select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub region: CaptureRegion,
    pub layout: OverlayLayout,
}

/// Requests from the user side (CLI, stdin, a GUI)
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerCommand {
    Select(LogicalRect),
    Start,
    Stop,
    Toggle,
    /// User scale percentage, used by the next selection
    SetScale(u32),
    SetSource(SourceLanguage),
    SetEngine(OcrEngineKind),
    SetTarget(TargetLanguage),
    SetModel(String),
    Shutdown,
}

/// Where the scheduler thinks the displays are
#[derive(Debug, Clone)]
pub struct DisplayInfo {
    pub dpi_scale: f64,
    pub screen: ScreenBounds,
    /// Physical bounds of every display, empty when unknown
    pub displays: Vec<CaptureRegion>,
}

pub struct Scheduler {
    state: SchedulerState,
    selection: Option<Selection>,
    interval: Duration,
    scale_percent: u32,
    display: DisplayInfo,
    pipeline: Pipeline,
    presenter: Arc<dyn OverlayPresenter>,
}

impl Scheduler {
    pub fn new(
        pipeline: Pipeline,
        presenter: Arc<dyn OverlayPresenter>,
        display: DisplayInfo,
        interval: Duration,
        scale_percent: u32,
    ) -> Self {
        Self {
            state: SchedulerState::Idle,
            selection: None,
            interval: interval.max(Duration::from_millis(1)),
            scale_percent,
            display,
            pipeline,
            presenter,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn scale(&self) -> ScaleFactor {
        ScaleFactor::new(self.display.dpi_scale, self.scale_percent)
    }

    /// Map a freshly drawn rectangle and move the overlay next to it.
    /// A selection that can never be captured is reported and dropped;
    /// the previous one stays active.
    pub fn select(&mut self, rect: LogicalRect) -> Result<&Selection, SelectionError> {
        let Some(rect) = rect.normalized() else {
            let e = SelectionError::OutOfRange(rect);
            tracing::warn!("Rejected selection {:?}: {}", rect, e);
            self.presenter.notify(&e.to_string());
            return Err(e);
        };
        let scale = self.scale();
        let region = map_selection_to_region(&rect, scale);

        if let Err(e) = validate_selection(&region, &self.display.displays) {
            tracing::warn!("Rejected selection {:?}: {}", rect, e);
            self.presenter.notify(&e.to_string());
            return Err(e);
        }

        let layout = compute_overlay_layout(&region, scale, self.display.screen);
        tracing::info!(
            "Selected region {:?} at scale {:.2}, overlay at {:?}",
            region,
            scale.value(),
            layout
        );

        self.presenter.set_geometry(layout);
        self.presenter
            .notify(&format!("Selected Area: {}x{}", region.width, region.height));

        Ok(&*self.selection.insert(Selection { region, layout }))
    }

    /// Idle -> Running. Needs a selection.
    pub fn start(&mut self) -> Result<(), SelectionError> {
        if self.selection.is_none() {
            let e = SelectionError::Missing;
            self.presenter.notify(&e.to_string());
            return Err(e);
        }

        if self.state == SchedulerState::Idle {
            tracing::info!("Translation started, interval {:?}", self.interval);
            self.state = SchedulerState::Running;
            self.presenter.show();
        }
        Ok(())
    }

    /// Running -> Idle. Always succeeds.
    pub fn stop(&mut self) {
        if self.state == SchedulerState::Running {
            tracing::info!("Translation stopped: {}", self.pipeline.status().summary());
        }
        self.state = SchedulerState::Idle;
        self.presenter.hide();
    }

    pub fn toggle(&mut self) -> Result<(), SelectionError> {
        match self.state {
            SchedulerState::Idle => self.start(),
            SchedulerState::Running => {
                self.stop();
                Ok(())
            }
        }
    }

    pub fn set_scale(&mut self, percent: u32) {
        let clamped = percent.clamp(ScaleFactor::MIN_PERCENT, ScaleFactor::MAX_PERCENT);
        if clamped != percent {
            tracing::warn!("Scale {}% out of range, using {}%", percent, clamped);
        }
        self.scale_percent = clamped;
    }

    /// One pipeline pass over the current selection
    pub async fn tick(&mut self) -> Option<TickOutcome> {
        if self.state != SchedulerState::Running {
            return None;
        }
        let region = self.selection?.region;
        Some(self.pipeline.tick(region).await)
    }

    async fn reconfigure(&mut self, config: OcrConfig) {
        let label = format!("{} / {}", config.engine, config.language);
        match self.pipeline.reconfigure_ocr(config).await {
            Ok(()) => self.presenter.notify(&format!("OCR set to {label}")),
            Err(e) => {
                tracing::error!("OCR reconfiguration failed: {}", e);
                self.presenter.notify(&e.to_string());
            }
        }
    }

    /// Apply one command. Returns `false` when the scheduler should exit.
    pub async fn handle(&mut self, command: SchedulerCommand) -> bool {
        tracing::debug!("Scheduler command: {:?}", command);
        match command {
            SchedulerCommand::Select(rect) => {
                if let Err(e) = self.select(rect) {
                    tracing::debug!("Command not applied: {}", e);
                }
            }
            SchedulerCommand::Start => {
                if let Err(e) = self.start() {
                    tracing::debug!("Command not applied: {}", e);
                }
            }
            SchedulerCommand::Stop => self.stop(),
            SchedulerCommand::Toggle => {
                if let Err(e) = self.toggle() {
                    tracing::debug!("Command not applied: {}", e);
                }
            }
            SchedulerCommand::SetScale(percent) => self.set_scale(percent),
            SchedulerCommand::SetSource(language) => {
                let config = self.pipeline.ocr_config().with_language(language);
                self.reconfigure(config).await;
            }
            SchedulerCommand::SetEngine(engine) => {
                let config = self.pipeline.ocr_config().with_engine(engine);
                self.reconfigure(config).await;
            }
            SchedulerCommand::SetTarget(target) => {
                self.pipeline.set_target(target);
                self.presenter.notify(&format!("Target language: {target}"));
            }
            SchedulerCommand::SetModel(model) => {
                self.presenter.notify(&format!("Model: {model}"));
                self.pipeline.set_model(model);
            }
            SchedulerCommand::Shutdown => return false,
        }
        true
    }

    /// Drive the scheduler until shutdown. Ticks never overlap: each one
    /// finishes its whole pass before the next can fire.
    pub async fn run(
        mut self,
        commands: AsyncReceiver<SchedulerCommand>,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let running = self.state == SchedulerState::Running;

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scheduler cancelled");
                    break;
                }
                command = commands.recv() => {
                    let Ok(command) = command else {
                        tracing::info!("Command channel closed");
                        break;
                    };
                    let was_running = running;
                    if !self.handle(command).await {
                        break;
                    }
                    if !was_running && self.state == SchedulerState::Running {
                        ticker.reset_immediately();
                    }
                }
                _ = ticker.tick(), if running => {
                    if let Some(outcome) = self.tick().await {
                        tracing::trace!("Tick: {:?}", outcome);
                    }
                }
            }
        }

        self.stop();
        Ok(())
    }
}
