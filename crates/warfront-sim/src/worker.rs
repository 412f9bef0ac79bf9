//! Match worker thread: runs one match fed by a command channel.
//!
//! The engine moves into the thread and is returned on shutdown. Commands
//! arrive via `mpsc` channel and are applied strictly in order; every
//! effect goes to the worker's sink. Time comes only from `Tick`
//! commands, so a worker replays exactly like a directly driven engine.

use std::io;
use std::sync::mpsc;
use std::thread::JoinHandle;

use thiserror::Error;

use warfront_core::interactions::Interaction;
use warfront_core::state::MatchSnapshot;
use warfront_core::types::{PerTeam, Team};

use crate::engine::MatchEngine;
use crate::sink::EffectSink;

/// Commands accepted by a match worker.
#[derive(Debug)]
pub enum WorkerCommand {
    Interact(Interaction),
    Tick { delta_ms: u64 },
    Reset,
    /// End the match now, decided on score then population.
    EndEarly { population: PerTeam<u32> },
    /// Reply with the current snapshot.
    Snapshot(mpsc::Sender<MatchSnapshot>),
    /// Reply with the winner, if decided.
    Winner(mpsc::Sender<Option<Team>>),
    Shutdown,
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn match worker: {0}")]
    Spawn(#[from] io::Error),
    #[error("match worker has stopped")]
    Disconnected,
    #[error("match worker panicked")]
    Panicked,
}

/// Handle to a running match worker.
pub struct MatchWorker {
    commands: mpsc::Sender<WorkerCommand>,
    thread: JoinHandle<MatchEngine>,
}

/// Spawn a worker thread owning `engine`. Effects go to `sink`.
pub fn spawn_match_worker(
    mut engine: MatchEngine,
    sink: Box<dyn EffectSink + Send>,
) -> Result<MatchWorker, WorkerError> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<WorkerCommand>();
    let name = format!("warfront-{}", engine.topology().map);
    engine.set_sink(sink);

    let thread = std::thread::Builder::new()
        .name(name)
        .spawn(move || run_worker(engine, cmd_rx))?;

    Ok(MatchWorker {
        commands: cmd_tx,
        thread,
    })
}

impl MatchWorker {
    pub fn send(&self, command: WorkerCommand) -> Result<(), WorkerError> {
        self.commands
            .send(command)
            .map_err(|_| WorkerError::Disconnected)
    }

    pub fn interact(&self, interaction: Interaction) -> Result<(), WorkerError> {
        self.send(WorkerCommand::Interact(interaction))
    }

    pub fn tick(&self, delta_ms: u64) -> Result<(), WorkerError> {
        self.send(WorkerCommand::Tick { delta_ms })
    }

    /// Snapshot after every previously sent command has been applied.
    pub fn snapshot(&self) -> Result<MatchSnapshot, WorkerError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(WorkerCommand::Snapshot(reply_tx))?;
        reply_rx.recv().map_err(|_| WorkerError::Disconnected)
    }

    pub fn winner(&self) -> Result<Option<Team>, WorkerError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(WorkerCommand::Winner(reply_tx))?;
        reply_rx.recv().map_err(|_| WorkerError::Disconnected)
    }

    /// Stop the worker and take the engine back.
    pub fn shutdown(self) -> Result<MatchEngine, WorkerError> {
        // The worker may already have stopped; joining tells us how.
        let _ = self.commands.send(WorkerCommand::Shutdown);
        self.thread.join().map_err(|_| WorkerError::Panicked)
    }
}

/// The worker loop. Runs until Shutdown or channel disconnect.
fn run_worker(mut engine: MatchEngine, cmd_rx: mpsc::Receiver<WorkerCommand>) -> MatchEngine {
    tracing::debug!(
        target: "warfront::worker",
        map = %engine.topology().map,
        "worker.started"
    );
    while let Ok(command) = cmd_rx.recv() {
        match command {
            WorkerCommand::Interact(interaction) => {
                engine.handle_interaction(&interaction);
            }
            WorkerCommand::Tick { delta_ms } => {
                engine.tick(delta_ms);
            }
            WorkerCommand::Reset => engine.reset(),
            WorkerCommand::EndEarly { population } => {
                engine.end_early(population);
            }
            WorkerCommand::Snapshot(reply) => {
                let _ = reply.send(engine.snapshot());
            }
            WorkerCommand::Winner(reply) => {
                let _ = reply.send(engine.winner());
            }
            WorkerCommand::Shutdown => break,
        }
    }
    tracing::debug!(
        target: "warfront::worker",
        map = %engine.topology().map,
        result = ?engine.result(),
        "worker.stopped"
    );
    engine
}
