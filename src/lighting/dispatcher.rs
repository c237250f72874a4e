use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, TrySendError};
use log::{debug, warn};
use tokio::runtime::Handle;

use super::bridge::LightBridge;
use super::mapper::LightCommand;

/// Fire-and-forget path from the frame loop to the bridge.
///
/// Commands cross a small bounded queue to a worker thread that drives the
/// async bridge call. Frames arrive far faster than a network round-trip, so
/// when the fixture falls behind the queue fills and new commands are dropped
/// rather than queued; a stale brightness is worthless by the time a backlog
/// would drain. Dispatch failures are logged and never touch the frame path.
#[derive(Clone)]
pub struct CommandDispatcher {
    sender: Sender<LightCommand>,
}

impl CommandDispatcher {
    /// Spawns the dispatch worker.
    ///
    /// The returned join handle finishes once every dispatcher clone is
    /// dropped and the queue has drained.
    pub fn spawn(
        bridge: Arc<dyn LightBridge>,
        runtime: Handle,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = crossbeam_channel::bounded::<LightCommand>(capacity.max(1));

        let worker = thread::spawn(move || {
            for command in receiver.iter() {
                let result =
                    runtime.block_on(bridge.set_light_state(command.light_id, &command.state));
                match result {
                    Ok(true) => {}
                    Ok(false) => warn!("light {} rejected state change", command.light_id),
                    Err(err) => warn!("dispatch to light {} failed: {err}", command.light_id),
                }
            }
        });

        (Self { sender }, worker)
    }

    /// Hands a command to the worker without ever blocking.
    pub fn dispatch(&self, command: LightCommand) {
        match self.sender.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => {
                debug!("dropping stale command for light {}", command.light_id);
            }
            Err(TrySendError::Disconnected(command)) => {
                warn!("dispatch worker gone; dropping command for light {}", command.light_id);
            }
        }
    }
}
