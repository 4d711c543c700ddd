use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::core::{execute, Completion, Request};
use crate::remote::{TaskRepository, UserRegistry};

/// Runs requests on a background runtime so the draw loop never blocks.
/// Completions queue up until the next tick drains them.
pub(crate) struct Dispatcher {
    runtime: Runtime,
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRegistry>,
    sender: UnboundedSender<Completion>,
    receiver: UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl Dispatcher {
    pub(crate) fn new(tasks: Arc<dyn TaskRepository>, users: Arc<dyn UserRegistry>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;
        let (sender, receiver) = mpsc::unbounded_channel();
        Ok(Self {
            runtime,
            tasks,
            users,
            sender,
            receiver,
            in_flight: 0,
        })
    }

    pub(crate) fn dispatch(&mut self, request: Request) {
        tracing::debug!(?request, "dispatching");
        let tasks = Arc::clone(&self.tasks);
        let users = Arc::clone(&self.users);
        let sender = self.sender.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let completion = execute(request, tasks.as_ref(), users.as_ref()).await;
            if sender.send(completion).is_err() {
                tracing::warn!("completion dropped, form already closed");
            }
        });
    }

    /// Completions that arrived since the last call.
    pub(crate) fn drain(&mut self) -> Vec<Completion> {
        let mut ready = Vec::new();
        while let Ok(completion) = self.receiver.try_recv() {
            ready.push(completion);
        }
        self.in_flight = self.in_flight.saturating_sub(ready.len());
        ready
    }

    /// Block until one completion arrives. Returns `None` when nothing is in flight.
    #[cfg(test)]
    pub(crate) fn wait_one(&mut self) -> Option<Completion> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.runtime.block_on(self.receiver.recv())?;
        self.in_flight -= 1;
        Some(completion)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight
    }
}
