use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use shared::domain::MachineState;

/// Process-wide holder for the latest machine snapshot and the queue of
/// operator commands awaiting pickup. Clones are cheap and share state.
#[derive(Clone, Default)]
pub struct StateStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    machine: MachineState,
    queue: VecDeque<String>,
    last_update: Option<DateTime<Utc>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace_machine_state(&self, next: MachineState) {
        let mut inner = self.inner.lock().await;
        inner.machine = next;
        inner.last_update = Some(Utc::now());
    }

    pub async fn machine_state(&self) -> (MachineState, Option<DateTime<Utc>>) {
        let inner = self.inner.lock().await;
        (inner.machine.clone(), inner.last_update)
    }

    /// Appends a qualified command and returns the resulting queue depth.
    pub async fn enqueue_command(&self, command: String) -> usize {
        let mut inner = self.inner.lock().await;
        inner.queue.push_back(command);
        inner.queue.len()
    }

    /// Removes and returns the oldest pending command.
    ///
    /// There is no separate peek: removal happens under the same lock as
    /// the read, so a command handed to one caller is gone for everyone
    /// else.
    pub async fn take_next_command(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        inner.queue.pop_front()
    }

    pub async fn pending_commands(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.queue.len()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
