//! Background task execution
//!
//! Long-running operations (render, export, import) run on dedicated
//! threads and report back over an unbounded channel. Every task emits
//! zero or more `Progress` messages followed by exactly one terminal
//! `Success` or `Error`. Dropping the handle disconnects the channel;
//! the worker's sends start failing and it winds down on its own, which
//! is the only cancellation this layer offers.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

use crate::archive;
use crate::error::{KitError, Result};
use crate::kit::config::RenderConfig;
use crate::kit::id::TaskId;
use crate::kit::project::ProjectSnapshot;
use crate::render::{render_kit, RenderedKit};

// ============================================================================
// Messages and handles
// ============================================================================

/// One message from a running task
#[derive(Debug)]
pub enum TaskMessage<T> {
    /// Completion estimate in percent, 0 through 100
    Progress(f32),
    /// Terminal: the task finished and this is its output
    Success(T),
    /// Terminal: the task failed
    Error(KitError),
}

/// Receiving end of a spawned task
#[derive(Debug)]
pub struct TaskHandle<T> {
    pub id: TaskId,
    receiver: Receiver<TaskMessage<T>>,
}

impl<T> TaskHandle<T> {
    /// Iterate over messages until the channel closes
    pub fn messages(&self) -> impl Iterator<Item = TaskMessage<T>> + '_ {
        self.receiver.iter()
    }

    /// Block until the terminal message, discarding progress.
    ///
    /// Returns an error if the worker disappeared without a terminal
    /// message, which should not happen.
    pub fn wait(self) -> Result<T> {
        for message in self.receiver.iter() {
            match message {
                TaskMessage::Progress(_) => continue,
                TaskMessage::Success(value) => return Ok(value),
                TaskMessage::Error(e) => return Err(e),
            }
        }
        Err(KitError::Render {
            reason: "task ended without a result".to_string(),
        })
    }

    /// Block until the terminal message, feeding progress to a callback
    pub fn wait_with_progress(self, mut on_progress: impl FnMut(f32)) -> Result<T> {
        for message in self.receiver.iter() {
            match message {
                TaskMessage::Progress(p) => on_progress(p),
                TaskMessage::Success(value) => return Ok(value),
                TaskMessage::Error(e) => return Err(e),
            }
        }
        Err(KitError::Render {
            reason: "task ended without a result".to_string(),
        })
    }
}

// ============================================================================
// Spawning
// ============================================================================

/// Run a job on its own thread, wiring its progress into the channel.
///
/// The job receives a progress sink. After it returns, exactly one
/// terminal message is sent. Send failures are ignored: a dropped handle
/// means nobody is listening anymore.
pub fn spawn<T, F>(job: F) -> TaskHandle<T>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn FnMut(f32)) -> Result<T> + Send + 'static,
{
    let id = TaskId::new();
    let (sender, receiver) = unbounded();

    std::thread::spawn(move || {
        let progress_sender: Sender<TaskMessage<T>> = sender.clone();
        let mut on_progress = move |p: f32| {
            let _ = progress_sender.send(TaskMessage::Progress(p));
        };

        let terminal = match job(&mut on_progress) {
            Ok(value) => TaskMessage::Success(value),
            Err(e) => TaskMessage::Error(e),
        };
        let _ = sender.send(terminal);
    });

    debug!(task = %id, "spawned task");
    TaskHandle { id, receiver }
}

/// Render the kit on a background thread
pub fn spawn_render(
    slots: Vec<Option<Vec<u8>>>,
    config: RenderConfig,
    layout_total: u32,
) -> TaskHandle<RenderedKit> {
    spawn(move |on_progress| render_kit(&slots, &config, layout_total, on_progress))
}

/// Serialize a snapshot to archive bytes on a background thread
pub fn spawn_export(snapshot: ProjectSnapshot) -> TaskHandle<Vec<u8>> {
    spawn(move |on_progress| archive::export(&snapshot, on_progress))
}

/// Parse archive bytes into a snapshot on a background thread
pub fn spawn_import(bytes: Vec<u8>) -> TaskHandle<ProjectSnapshot> {
    spawn(move |on_progress| {
        on_progress(0.0);
        let snapshot = archive::import(&bytes)?;
        on_progress(100.0);
        Ok(snapshot)
    })
}

// ============================================================================
// Tests
// ============================================================================
