use kanal::AsyncSender;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use crate::cli::{COMMAND_HELP, parse_command};
use crate::scheduler::SchedulerCommand;

/// Read commands line by line and forward them to the scheduler.
/// Ends on EOF, on `quit`, or when cancelled.
pub async fn command_input_loop<R>(
    reader: R,
    cancel: CancellationToken,
    command_tx: AsyncSender<SchedulerCommand>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            tracing::debug!("Command input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(command) => {
                let quit = command == SchedulerCommand::Shutdown;
                if command_tx.send(command).await.is_err() {
                    tracing::warn!("Scheduler is gone, dropping input");
                    break;
                }
                if quit {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("{}", e);
                tracing::info!("{}", COMMAND_HELP);
            }
        }
    }

    Ok(())
}
