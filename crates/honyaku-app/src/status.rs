use std::time::SystemTime;

/// Counters kept by the pipeline, logged when capture stops
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineStatus {
    pub ticks: u64,
    pub translations: u64,
    pub capture_errors: u64,
    pub translation_errors: u64,
    pub last_capture_time: Option<SystemTime>,
}

impl PipelineStatus {
    pub fn summary(&self) -> String {
        format!(
            "{} ticks, {} translations, {} capture errors, {} translation errors",
            self.ticks, self.translations, self.capture_errors, self.translation_errors
        )
    }
}
