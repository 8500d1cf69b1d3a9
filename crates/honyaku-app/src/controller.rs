use std::sync::Arc;

use honyaku_types::OverlayEvent;
use kanal::{AsyncReceiver, AsyncSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::io::command_input_loop;
use crate::overlay::{ChannelPresenter, OverlayPresenter, console_overlay_loop};
use crate::scheduler::{Scheduler, SchedulerCommand};

/// Centralized channel management
pub struct ChannelSet {
    pub commands: (AsyncSender<SchedulerCommand>, AsyncReceiver<SchedulerCommand>),
    pub overlay: (AsyncSender<OverlayEvent>, AsyncReceiver<OverlayEvent>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            commands: kanal::bounded_async(64), // user input
            overlay: kanal::unbounded_async(),  // presenter calls must never block a tick
        }
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new() -> Self {
        Self {
            channels: ChannelSet::new(),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Presenter the scheduler and pipeline talk to
    pub fn presenter(&self) -> Arc<dyn OverlayPresenter> {
        Arc::new(ChannelPresenter::new(self.channels.overlay.0.clone_sync()))
    }

    pub fn command_sender(&self) -> AsyncSender<SchedulerCommand> {
        self.channels.commands.0.clone()
    }

    pub fn spawn_tasks(&self, scheduler: Scheduler) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        // Scheduler owns the pipeline
        tasks.spawn(scheduler.run(
            self.channels.commands.1.clone(),
            self.cancel_token.child_token(),
        ));

        // Overlay
        tasks.spawn(console_overlay_loop(self.channels.overlay.1.clone()));

        // Stdin commands
        tasks.spawn(command_input_loop(
            tokio::io::BufReader::new(tokio::io::stdin()),
            self.cancel_token.child_token(),
            self.channels.commands.0.clone(),
        ));

        tasks
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Default for AppController {
    fn default() -> Self {
        Self::new()
    }
}
