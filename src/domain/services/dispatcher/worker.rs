//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The engine worker: a dedicated thread owning one engine, consuming commands from a channel and
// answering each through its own reply channel. This is the serialization point the engine
// relies on; whoever holds the client can only ever have one command in flight.
//
// | Name          | Description                                        |
// |---------------|----------------------------------------------------|
// | EngineWorker  | Spawns the engine thread.                          |
// | EngineClient  | Submits command lines and waits for the reply.     |
// | WorkerError   | Channel disconnection.                             |
//--------------------------------------------------------------------------------------------------

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use thiserror::Error;
use tracing::info;

use crate::domain::services::dispatcher::dispatcher::{Reply, dispatch};
use crate::domain::services::matching_engine::Engine;

/// Channel failure talking to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The worker thread is gone.
    #[error("engine worker disconnected")]
    Disconnected,
}

struct Command {
    line: String,
    reply_tx: Sender<Reply>,
}

/// Runs one engine on its own thread.
pub struct EngineWorker;

impl EngineWorker {
    /// Spawns the worker and returns a client plus the thread handle. The
    /// worker stops once every client clone is dropped.
    pub fn start(mut engine: Engine) -> (EngineClient, JoinHandle<()>) {
        let (command_tx, command_rx): (Sender<Command>, Receiver<Command>) = unbounded();

        let handle = thread::spawn(move || {
            info!(
                venue = engine.venue(),
                symbol = engine.symbol(),
                "engine worker started"
            );
            while let Ok(command) = command_rx.recv() {
                let reply = dispatch(&mut engine, &command.line);
                // A client that gave up on its reply is not our problem.
                let _ = command.reply_tx.send(reply);
            }
            info!("engine worker stopped");
        });

        (EngineClient { command_tx }, handle)
    }
}

/// Client handle to a running engine worker.
#[derive(Clone)]
pub struct EngineClient {
    command_tx: Sender<Command>,
}

impl EngineClient {
    /// Submits one command line and blocks for its reply.
    pub fn submit(&self, line: &str) -> Result<Reply, WorkerError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.command_tx
            .send(Command {
                line: line.to_string(),
                reply_tx,
            })
            .map_err(|_| WorkerError::Disconnected)?;
        reply_rx.recv().map_err(|_| WorkerError::Disconnected)
    }
}
