/// True when `new_text` is worth translating: non-empty and different from
/// the last text that was translated. Exact string comparison only.
pub fn should_translate(new_text: &str, previous_text: &str) -> bool {
    !new_text.is_empty() && new_text != previous_text
}

/// Owner of the last recognized text. The pipeline may only ask and record,
/// never write the stored text directly.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    previous: String,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_translate(&self, new_text: &str) -> bool {
        should_translate(new_text, &self.previous)
    }

    /// Remember `text` as the last translated text. Ignored unless
    /// `should_translate` would accept it.
    pub fn record(&mut self, text: &str) {
        if self.should_translate(text) {
            tracing::trace!("previous text replaced ({} chars)", text.chars().count());
            self.previous = text.to_string();
        }
    }

    pub fn previous(&self) -> &str {
        &self.previous
    }
}
