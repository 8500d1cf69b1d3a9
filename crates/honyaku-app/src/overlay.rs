use std::io::Write;

use honyaku_types::{OverlayEvent, OverlayLayout};
use kanal::{AsyncReceiver, Sender};

/// Whatever shows the translation. Rendering is someone else's job; the
/// pipeline only says what to show and where.
pub trait OverlayPresenter: Send + Sync {
    fn show(&self);
    fn hide(&self);
    fn set_text(&self, text: &str);
    fn set_geometry(&self, layout: OverlayLayout);
    /// User-facing message that is not overlay content
    fn notify(&self, message: &str);
}

/// Forwards every call as an [`OverlayEvent`] to the UI side
#[derive(Clone)]
pub struct ChannelPresenter {
    tx: Sender<OverlayEvent>,
}

impl ChannelPresenter {
    pub fn new(tx: Sender<OverlayEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: OverlayEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("overlay receiver is gone, dropping event");
        }
    }
}

impl OverlayPresenter for ChannelPresenter {
    fn show(&self) {
        self.send(OverlayEvent::Show);
    }

    fn hide(&self) {
        self.send(OverlayEvent::Hide);
    }

    fn set_text(&self, text: &str) {
        self.send(OverlayEvent::SetText(text.to_string()));
    }

    fn set_geometry(&self, layout: OverlayLayout) {
        self.send(OverlayEvent::SetGeometry(layout));
    }

    fn notify(&self, message: &str) {
        self.send(OverlayEvent::Status(message.to_string()));
    }
}

/// Terminal stand-in for the floating window: translations go to stdout,
/// window state goes to the log.
pub async fn console_overlay_loop(rx: AsyncReceiver<OverlayEvent>) -> anyhow::Result<()> {
    let mut visible = false;
    let mut layout: Option<OverlayLayout> = None;

    while let Ok(event) = rx.recv().await {
        match event {
            OverlayEvent::Show => {
                visible = true;
                tracing::info!("[OVERLAY] shown at {:?}", layout);
            }
            OverlayEvent::Hide => {
                visible = false;
                tracing::info!("[OVERLAY] hidden");
            }
            OverlayEvent::SetGeometry(new_layout) => {
                tracing::debug!("[OVERLAY] geometry {:?}", new_layout);
                layout = Some(new_layout);
            }
            OverlayEvent::SetText(text) => {
                if visible {
                    let mut stdout = std::io::stdout().lock();
                    writeln!(stdout, "{text}")?;
                    stdout.flush()?;
                }
            }
            OverlayEvent::Status(message) => {
                tracing::info!("[STATUS] {}", message);
            }
        }
    }

    Ok(())
}
