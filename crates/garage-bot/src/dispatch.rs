//! Per-user event ordering: one worker task per user, fed in arrival order.
//! Different users' workers run concurrently. A worker that sits idle for
//! the idle timeout exits; the user's next event starts a fresh one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::SendError, UnboundedSender};
use tokio::task::JoinHandle;

use crate::commands::Inbound;
use crate::session::UserId;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Processes one inbound event to completion.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, event: Inbound) -> impl Future<Output = ()> + Send;
}

struct Worker {
    sender: UnboundedSender<Inbound>,
    task: JoinHandle<()>,
}

pub struct Dispatcher<H> {
    handler: Arc<H>,
    idle_timeout: Duration,
    workers: HashMap<UserId, Worker>,
}

impl<H: Handler> Dispatcher<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self::with_idle_timeout(handler, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(handler: Arc<H>, idle_timeout: Duration) -> Self {
        Self {
            handler,
            idle_timeout,
            workers: HashMap::new(),
        }
    }

    /// Queues `event` behind the user's earlier events. Must be called from
    /// within a tokio runtime.
    pub fn dispatch(&mut self, event: Inbound) {
        self.prune_finished();

        let user = event.user;
        let (event, previous) = match self.workers.remove(&user) {
            Some(worker) => match worker.sender.send(event) {
                Ok(()) => {
                    self.workers.insert(user, worker);
                    return;
                }
                // The worker went idle or its handler panicked. The new one
                // waits for it, so events it is still draining keep their order.
                Err(SendError(event)) => {
                    tracing::debug!(user_id = user, "user worker closed, restarting");
                    (event, Some(worker.task))
                }
            },
            None => (event, None),
        };

        let worker = self.spawn_worker(user, previous);
        if worker.sender.send(event).is_err() {
            tracing::error!(user_id = user, "new user worker rejected event");
        }
        self.workers.insert(user, worker);
    }

    /// Users with a live worker.
    pub fn active_users(&mut self) -> usize {
        self.prune_finished();
        self.workers.len()
    }

    fn prune_finished(&mut self) {
        self.workers.retain(|_, worker| !worker.task.is_finished());
    }

    fn spawn_worker(&self, user: UserId, previous: Option<JoinHandle<()>>) -> Worker {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Inbound>();
        let handler = Arc::clone(&self.handler);
        let idle_timeout = self.idle_timeout;
        let task = tokio::spawn(async move {
            if let Some(previous) = previous {
                if previous.await.is_err() {
                    tracing::warn!(user_id = user, "previous user worker panicked");
                }
            }
            loop {
                match tokio::time::timeout(idle_timeout, receiver.recv()).await {
                    Ok(Some(event)) => handler.handle(event).await,
                    Ok(None) => break,
                    // Refuse new events, then drain whatever is already queued.
                    Err(_) => receiver.close(),
                }
            }
            tracing::debug!(user_id = user, "user worker stopped");
        });
        tracing::debug!(user_id = user, "user worker started");
        Worker { sender, task }
    }
}
