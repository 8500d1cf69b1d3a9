use clap::Parser;
use honyaku_config::Config;
use honyaku_types::{LogicalRect, OcrEngineKind, SourceLanguage, TargetLanguage};

use crate::scheduler::SchedulerCommand;

/// Translate text inside a screen region as it changes
#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Left edge of the initial selection, logical pixels
    #[arg(long, requires_all = ["top", "width", "height"], allow_hyphen_values = true)]
    pub left: Option<i32>,

    /// Top edge of the initial selection, logical pixels
    #[arg(long, requires_all = ["left", "width", "height"], allow_hyphen_values = true)]
    pub top: Option<i32>,

    #[arg(long, requires_all = ["left", "top", "height"])]
    pub width: Option<i32>,

    #[arg(long, requires_all = ["left", "top", "width"])]
    pub height: Option<i32>,

    /// Scale percentage applied on top of the display DPI (100-300)
    #[arg(long)]
    pub scale: Option<u32>,

    /// OCR engine: windows or paddle
    #[arg(long)]
    pub engine: Option<OcrEngineKind>,

    /// Source language: en or ja
    #[arg(long)]
    pub source: Option<SourceLanguage>,

    /// Target language: zh-tw or en
    #[arg(long)]
    pub target: Option<TargetLanguage>,

    /// Translation model name
    #[arg(long)]
    pub model: Option<String>,

    /// Delay between captures in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Print the models the translation service offers and exit
    #[arg(long)]
    pub list_models: bool,

    /// Start translating right away (needs an initial selection)
    #[arg(long)]
    pub start: bool,
}

impl Args {
    pub fn selection(&self) -> Option<LogicalRect> {
        Some(LogicalRect::new(
            self.left?,
            self.top?,
            self.width?,
            self.height?,
        ))
    }

    /// Command line wins over the environment
    pub fn apply(&self, config: &mut Config) {
        if let Some(scale) = self.scale {
            config.scale_percent = scale.clamp(100, 300);
        }
        if let Some(engine) = self.engine {
            config.ocr.engine = engine;
        }
        if let Some(source) = self.source {
            config.ocr.language = source;
        }
        if let Some(target) = self.target {
            config.translator.target_language = target;
        }
        if let Some(model) = &self.model {
            config.translator.model = model.clone();
        }
        if let Some(interval) = self.interval_ms {
            config.capture_interval_ms = interval.max(1);
        }
    }
}

pub const COMMAND_HELP: &str = "commands: select L T W H | start | stop | toggle | scale N | \
source en|ja | engine windows|paddle | target zh-tw|en | model NAME | quit";

/// Parse one line typed on stdin
pub fn parse_command(line: &str) -> Result<SchedulerCommand, String> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Err("empty command".to_string());
    };
    let rest: Vec<&str> = words.collect();

    match name.to_lowercase().as_str() {
        "select" => {
            let numbers = rest
                .iter()
                .map(|v| v.parse::<i32>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("select: {e}"))?;
            match numbers.as_slice() {
                [left, top, width, height] => Ok(SchedulerCommand::Select(LogicalRect::new(
                    *left, *top, *width, *height,
                ))),
                _ => Err("select takes LEFT TOP WIDTH HEIGHT".to_string()),
            }
        }
        "start" => Ok(SchedulerCommand::Start),
        "stop" => Ok(SchedulerCommand::Stop),
        "toggle" => Ok(SchedulerCommand::Toggle),
        "scale" => single(name, &rest, "percentage")?
            .parse::<u32>()
            .map(SchedulerCommand::SetScale)
            .map_err(|e| format!("scale: {e}")),
        "source" => single(name, &rest, "language")?
            .parse()
            .map(SchedulerCommand::SetSource),
        "engine" => single(name, &rest, "engine name")?
            .parse()
            .map(SchedulerCommand::SetEngine),
        "target" => single(name, &rest, "language")?
            .parse()
            .map(SchedulerCommand::SetTarget),
        "model" => {
            single(name, &rest, "model name").map(|m| SchedulerCommand::SetModel(m.to_string()))
        }
        "quit" | "exit" => Ok(SchedulerCommand::Shutdown),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn single<'a>(name: &str, rest: &[&'a str], what: &str) -> Result<&'a str, String> {
    match rest {
        [value] => Ok(*value),
        _ => Err(format!("{name} takes one {what}")),
    }
}
