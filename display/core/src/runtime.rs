//! Runtime - Driving an Engine from Async Code
//!
//! The engine itself is synchronous. This module is the single task that owns
//! a [`CommandDispatcher`] and feeds it from one input channel, waking up for
//! scheduled deadlines in between. Commands and surface signals share the
//! channel, so they are handled strictly in arrival order.
//!
//! # Design Philosophy
//!
//! One owner, no locks. Deadlines win ties against input so a frame or settle
//! timer that is already due is never starved by a busy host.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::commands::{RawCommand, Reply};
use crate::dispatcher::CommandDispatcher;
use crate::error::EngineError;
use crate::surface::{RenderSurface, SurfaceEvent};

/// One unit of work for the runtime
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineInput {
    /// Host command, optionally correlated by `id`
    Command {
        /// Correlation id echoed back in the reply
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        /// The command itself
        #[serde(flatten)]
        command: RawCommand,
    },
    /// Signal from the render surface
    Event {
        /// The signal
        event: SurfaceEvent,
    },
}

impl EngineInput {
    /// Uncorrelated command
    pub fn command(command: RawCommand) -> Self {
        Self::Command { id: None, command }
    }

    /// Surface signal
    #[must_use]
    pub fn event(event: SurfaceEvent) -> Self {
        Self::Event { event }
    }
}

/// Result of dispatching one command
#[derive(Debug)]
pub struct Dispatched {
    /// Correlation id from the input
    pub id: Option<u64>,
    /// Command name as received
    pub command: String,
    /// What the dispatcher answered
    pub result: Result<Reply, EngineError>,
}

/// Handle for feeding a running engine
pub type InputSender = mpsc::Sender<EngineInput>;

/// Drive `dispatcher` until every input sender is dropped
///
/// `on_reply` sees every command result in input order. The dispatcher is
/// handed back when the channel closes; deadlines still pending at that point
/// are not fired.
pub async fn run<S, F>(
    mut dispatcher: CommandDispatcher<S>,
    mut inputs: mpsc::Receiver<EngineInput>,
    mut on_reply: F,
) -> CommandDispatcher<S>
where
    S: RenderSurface,
    F: FnMut(Dispatched),
{
    tracing::debug!("Display runtime started");
    loop {
        let deadline = dispatcher.next_deadline();
        tokio::select! {
            biased;

            () = wait_until(deadline) => {
                dispatcher.fire_due(Instant::now());
            }

            input = inputs.recv() => match input {
                Some(EngineInput::Command { id, command }) => {
                    let result = dispatcher.dispatch_raw(&command);
                    if let Err(e) = &result {
                        tracing::warn!(command = %command.command, error = %e, "Command failed");
                    }
                    on_reply(Dispatched {
                        id,
                        command: command.command,
                        result,
                    });
                }
                Some(EngineInput::Event { event }) => dispatcher.handle_event(event),
                None => break,
            },
        }
    }
    tracing::debug!("Display runtime stopped");
    dispatcher
}

/// Sleep until `deadline`, or forever when there is none
fn wait_until(deadline: Option<Instant>) -> impl Future<Output = ()> {
    async move {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::notifications::Notifier;
    use crate::scheduler::Outcome;
    use crate::screen::ScreenVisibility;
    use crate::surface::RecordingSurface;
    use serde_json::{json, Value};

    #[test]
    fn test_input_wire_shapes() {
        let input: EngineInput =
            serde_json::from_value(json!({ "id": 7, "command": "play" })).unwrap();
        assert_eq!(
            input,
            EngineInput::Command {
                id: Some(7),
                command: RawCommand::new("play", Value::Null),
            }
        );

        let input: EngineInput = serde_json::from_value(json!({
            "event": { "type": "transitionFinished", "target": "surface" }
        }))
        .unwrap();
        assert!(matches!(input, EngineInput::Event { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_fires_deadlines_between_commands() {
        let surface = RecordingSurface::new();
        let engine = Engine::new(
            EngineConfig::default(),
            surface.clone(),
            Notifier::disconnected(),
        );
        let (tx, rx) = mpsc::channel(8);
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(run(CommandDispatcher::new(engine), rx, move |d| {
            let _ = reply_tx.send(d);
        }));

        tx.send(EngineInput::command(RawCommand::new("loadContent", Value::Null)))
            .await
            .unwrap();
        tx.send(EngineInput::command(RawCommand::new("toBlack", Value::Null)))
            .await
            .unwrap();

        let first = reply_rx.recv().await.unwrap();
        assert_eq!(first.command, "loadContent");
        assert!(first.result.is_ok());

        let second = reply_rx.recv().await.unwrap();
        let Ok(Reply::Pending(done)) = second.result else {
            panic!("expected pending reply");
        };
        assert_eq!(done.await, Outcome::Completed(ScreenVisibility::Black));

        drop(tx);
        let dispatcher = handle.await.unwrap();
        assert_eq!(dispatcher.engine().visibility(), ScreenVisibility::Black);
    }
}
