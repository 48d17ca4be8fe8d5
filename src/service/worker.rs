//! Single-writer worker for one domain
//!
//! The domain state lives on a dedicated OS thread. Callers submit closures
//! and await the reply, so every read and write of that domain is serialized
//! without locks inside the stores.

use crate::error::{MatchmakingError, Result};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

pub struct DomainWorker<S> {
    name: String,
    sender: mpsc::UnboundedSender<Job<S>>,
    handle: JoinHandle<()>,
}

impl<S: Send + 'static> DomainWorker<S> {
    /// Move `state` onto a new worker thread named `name`
    pub fn spawn(name: impl Into<String>, mut state: S) -> Result<Self> {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job<S>>();

        let thread_name = format!("{}-worker", name);
        let log_name = name.clone();
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                debug!("Worker {} started", log_name);
                while let Some(job) = receiver.blocking_recv() {
                    job(&mut state);
                }
                debug!("Worker {} drained its queue", log_name);
            })
            .map_err(|source| MatchmakingError::Io {
                context: format!("starting worker {}", name),
                source,
            })?;

        info!("Started {} worker", name);
        Ok(Self {
            name,
            sender,
            handle,
        })
    }

    /// Run `job` against the domain state and wait for its result
    pub async fn submit<F, R>(&self, job: F) -> Result<R>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        let boxed: Job<S> = Box::new(move |state: &mut S| {
            // The caller may have stopped waiting; the job still ran.
            let _ = reply.send(job(state));
        });

        self.sender
            .send(boxed)
            .map_err(|_| MatchmakingError::WorkerUnavailable)?;
        response.await.map_err(|_| {
            warn!("Worker {} dropped a job without replying", self.name);
            MatchmakingError::WorkerUnavailable
        })
    }

    /// Like [`submit`](Self::submit) for jobs that already return a domain result
    pub async fn call<F, R>(&self, job: F) -> Result<R>
    where
        F: FnOnce(&mut S) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.submit(job).await?
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        !self.sender.is_closed() && !self.handle.is_finished()
    }

    /// Stop accepting jobs, let queued ones finish and join the thread
    pub async fn shutdown(self) -> Result<()> {
        let DomainWorker {
            name,
            sender,
            handle,
        } = self;
        drop(sender);

        let joined = tokio::task::spawn_blocking(move || handle.join())
            .await
            .map_err(|_| MatchmakingError::WorkerUnavailable)?;
        if joined.is_err() {
            warn!("Worker {} panicked before shutdown", name);
            return Err(MatchmakingError::WorkerUnavailable);
        }

        info!("Stopped {} worker", name);
        Ok(())
    }
}
