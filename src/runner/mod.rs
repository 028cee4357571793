//! Runs the engine as a child process without blocking the caller.
//!
//! A [`Runner`] owns a single run slot. [`Runner::start`] moves it from
//! [`RunState::Idle`] to [`RunState::Running`], spawns the engine, and hands a
//! tokio task exclusive ownership of the child. The task streams output as
//! [`RunEvent`]s and frees the slot when the engine exits. A second start while
//! running is rejected with [`RunError::Busy`]; nothing is queued.

pub mod process;

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::Stream;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::command::Invocation;
use crate::config::ConfigError;
use crate::events::{self, RunEvent};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("translation is already running")]
    Busy,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create output folder {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to start engine `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

/// Holds the run slot; returns it to `Idle` on drop.
pub(crate) struct SlotGuard {
    slot: Arc<Mutex<RunState>>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        *self.slot.lock().unwrap() = RunState::Idle;
    }
}

/// Launches engine runs, one at a time. Clones share the same slot.
#[derive(Clone, Default)]
pub struct Runner {
    slot: Arc<Mutex<RunState>>,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        *self.slot.lock().unwrap()
    }

    pub fn is_busy(&self) -> bool {
        self.state() == RunState::Running
    }

    fn acquire(&self) -> Result<SlotGuard, RunError> {
        let mut state = self.slot.lock().unwrap();
        if *state == RunState::Running {
            return Err(RunError::Busy);
        }
        *state = RunState::Running;
        Ok(SlotGuard {
            slot: Arc::clone(&self.slot),
        })
    }

    /// Create the output folder, spawn the engine and return once it is running.
    ///
    /// Must be called from within a tokio runtime. On any error other than
    /// [`RunError::Busy`] the slot is left idle so the caller can retry.
    pub async fn start(&self, invocation: Invocation) -> Result<RunHandle, RunError> {
        let slot = self.acquire()?;

        tokio::fs::create_dir_all(&invocation.output_dir)
            .await
            .map_err(|source| RunError::OutputDir {
                path: invocation.output_dir.clone(),
                source,
            })?;

        let spawned = process::spawn(&invocation).map_err(|source| {
            tracing::error!(program = invocation.program(), error = %source, "engine failed to start");
            RunError::Spawn {
                program: invocation.program().to_string(),
                source,
            }
        })?;
        let pid = spawned.child.id();
        tracing::info!(pid, workdir = ?invocation.working_dir, "engine started");

        let (tx, rx) = events::channel();
        let running = Arc::new(AtomicBool::new(true));
        tokio::spawn(process::drive(spawned, tx, Arc::clone(&running), slot));

        Ok(RunHandle {
            events: rx,
            running,
            pid,
            lines: Vec::new(),
            exit_code: None,
        })
    }
}

/// Everything a finished run left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub lines: Vec<String>,
    pub exit_code: i32,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// The caller's view of one in-flight run.
///
/// Log lines are kept for display as they are received; nothing is persisted.
pub struct RunHandle {
    events: mpsc::UnboundedReceiver<RunEvent>,
    running: Arc<AtomicBool>,
    pid: Option<u32>,
    lines: Vec<String>,
    exit_code: Option<i32>,
}

impl RunHandle {
    /// Next event from the engine, or `None` after [`RunEvent::Completed`].
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        let event = self.events.recv().await?;
        match &event {
            RunEvent::LogLine(line) => self.lines.push(line.clone()),
            RunEvent::Completed(code) => self.exit_code = Some(*code),
        }
        Some(event)
    }

    /// Lines received so far.
    pub fn log(&self) -> &[String] {
        &self.lines
    }

    /// Exit code, once the completion event has been received.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Whether the engine process is still alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Drain every remaining event and return the full log and exit code.
    pub async fn wait(mut self) -> RunOutcome {
        while self.next_event().await.is_some() {}
        RunOutcome {
            lines: self.lines,
            exit_code: self.exit_code.unwrap_or(-1),
        }
    }

    /// The remaining events as a stream.
    pub fn into_stream(self) -> impl Stream<Item = RunEvent> {
        futures::stream::unfold(self, |mut handle| async move {
            let event = handle.next_event().await?;
            Some((event, handle))
        })
    }
}
