//! Timer-driven event loop.
//!
//! Ticks and user commands share one thread: commands are read from a channel
//! while waiting for the next tick, and the next deadline is only set once the
//! previous tick has finished, so ticks never overlap.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use beamwatch_bridge::CompanionBridge;

use crate::controller::{Navigation, PollController};
use crate::sink::DisplaySink;

/// Requests from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Previous,
    Next,
    Latest,
    ToggleAutomatic,
    Quit,
}

impl UserCommand {
    /// Map a line of terminal input to a command.
    pub fn from_key(input: &str) -> Option<Self> {
        match input.trim() {
            "p" | "prev" | "previous" => Some(UserCommand::Previous),
            "n" | "next" => Some(UserCommand::Next),
            "l" | "latest" => Some(UserCommand::Latest),
            "s" | "start" | "stop" => Some(UserCommand::ToggleAutomatic),
            "q" | "quit" | "exit" => Some(UserCommand::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: usize,
    pub commands: usize,
}

/// Run until `Quit` arrives or every sender is dropped, then shut the companion down.
pub fn run<B, S>(
    controller: &mut PollController<B, S>,
    commands: &Receiver<UserCommand>,
    interval: Duration,
) -> RunStats
where
    B: CompanionBridge,
    S: DisplaySink,
{
    let mut stats = RunStats::default();
    loop {
        let report = controller.tick();
        stats.ticks += 1;
        tracing::trace!(?report, "tick done");

        let deadline = Instant::now() + interval;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match commands.recv_timeout(remaining) {
                Ok(UserCommand::Quit) | Err(RecvTimeoutError::Disconnected) => {
                    controller.shutdown();
                    return stats;
                }
                Ok(command) => {
                    stats.commands += 1;
                    apply(controller, command);
                }
                Err(RecvTimeoutError::Timeout) => break,
            }
        }
    }
}

fn apply<B, S>(controller: &mut PollController<B, S>, command: UserCommand)
where
    B: CompanionBridge,
    S: DisplaySink,
{
    let navigation = match command {
        UserCommand::Previous => controller.go_previous(),
        UserCommand::Next => controller.go_next(),
        UserCommand::Latest => controller.go_latest(),
        UserCommand::ToggleAutomatic => {
            let mode = controller.toggle_automatic();
            tracing::debug!(?mode, "mode toggled");
            return;
        }
        UserCommand::Quit => return,
    };
    match navigation {
        Navigation::Moved(tag) => tracing::debug!(?command, %tag, "navigated"),
        Navigation::Boundary => tracing::debug!(?command, "already at boundary"),
        Navigation::Disabled => {
            tracing::info!(?command, "navigation is disabled while updating automatically")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(UserCommand::from_key("p\n"), Some(UserCommand::Previous));
        assert_eq!(UserCommand::from_key(" n "), Some(UserCommand::Next));
        assert_eq!(UserCommand::from_key("l"), Some(UserCommand::Latest));
        assert_eq!(UserCommand::from_key("s"), Some(UserCommand::ToggleAutomatic));
        assert_eq!(UserCommand::from_key("q"), Some(UserCommand::Quit));
        assert_eq!(UserCommand::from_key("x"), None);
        assert_eq!(UserCommand::from_key(""), None);
    }
}
