//! Console reset key
//!
//! Reads lines from stdin; a line equal to the configured key (case
//! insensitive) presses Reset and releases it one tick later, so the tick
//! loop sees it held for at least one tick.
//!
//! Stdin is read on a detached OS thread. A pending read there does not
//! keep the runtime alive at shutdown.

use std::io::BufRead;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::input::{Control, ControlEvent};

#[derive(Clone, Debug)]
pub struct ConsoleSettings {
    pub reset_key: String,
    /// How long the key stays pressed; one tick interval
    pub hold: Duration,
}

pub fn matches_reset_key(line: &str, key: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.eq_ignore_ascii_case(key.trim())
}

/// Forwards stdin lines until EOF or until the receiver is dropped
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (line_sender, line_receiver) = mpsc::channel(16);

    let spawned = std::thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if line_sender.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read console input: {}", e);
                        break;
                    }
                }
            }
            debug!("Console input thread finished");
        });

    if let Err(e) = spawned {
        warn!("Console input unavailable: {}", e);
    }
    line_receiver
}

/// Consumes `lines` until they end or shutdown is requested
pub async fn run_console_reset(
    mut lines: mpsc::Receiver<String>,
    settings: ConsoleSettings,
    sender: mpsc::Sender<ControlEvent>,
    shutdown: CancellationToken,
) {
    info!(
        "Console reset active, type '{}' and press enter to reset orientations",
        settings.reset_key
    );

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.recv() => line,
        };

        let Some(line) = line else {
            debug!("Console input closed");
            break;
        };

        if !matches_reset_key(&line, &settings.reset_key) {
            debug!("Ignoring console input {:?}", line);
            continue;
        }

        info!("Reset requested from console");
        if sender.send(ControlEvent::pressed(Control::Reset)).await.is_err() {
            break;
        }
        tokio::time::sleep(settings.hold).await;
        if sender.send(ControlEvent::canceled(Control::Reset)).await.is_err() {
            break;
        }
    }

    info!("Console reset reader finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_match_ignores_case_and_whitespace() {
        assert!(matches_reset_key("v", "v"));
        assert!(matches_reset_key("  V \n", "v"));
        assert!(!matches_reset_key("vv", "v"));
        assert!(!matches_reset_key("", "v"));
    }

    #[tokio::test]
    async fn reset_line_presses_then_releases() {
        let (line_tx, lines) = mpsc::channel(8);
        line_tx.send("hello".to_string()).await.unwrap();
        line_tx.send("V".to_string()).await.unwrap();
        drop(line_tx);
        let (tx, mut rx) = mpsc::channel(8);
        let settings = ConsoleSettings {
            reset_key: "v".to_string(),
            hold: Duration::from_millis(1),
        };

        run_console_reset(lines, settings, tx, CancellationToken::new()).await;

        assert_eq!(rx.recv().await, Some(ControlEvent::pressed(Control::Reset)));
        assert_eq!(rx.recv().await, Some(ControlEvent::canceled(Control::Reset)));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn cancellation_stops_reader_with_open_input() {
        let (_line_tx, lines) = mpsc::channel::<String>(8);
        let (tx, mut rx) = mpsc::channel(8);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let settings = ConsoleSettings {
            reset_key: "v".to_string(),
            hold: Duration::from_millis(1),
        };

        run_console_reset(lines, settings, tx, shutdown).await;

        assert_eq!(rx.recv().await, None);
    }
}
