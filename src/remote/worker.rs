//! Background thread that runs remote store calls off the UI thread

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use super::{RemoteCompletion, RemoteRequest, RemoteStore};

/// Runs requests one at a time against a store and queues their completions
pub struct RemoteWorker {
    requests: Sender<RemoteRequest>,
    completions: Receiver<RemoteCompletion>,
    /// Set once the thread is found to have exited
    stopped: bool,
}

impl RemoteWorker {
    /// Start the worker thread. `notify` runs after each completion is queued.
    pub fn spawn<F>(store: Arc<dyn RemoteStore>, notify: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<RemoteRequest>();
        let (completion_tx, completion_rx) = mpsc::channel();

        thread::spawn(move || {
            for request in request_rx {
                let completion = request.execute(store.as_ref());
                if completion_tx.send(completion).is_err() {
                    break; // Receiver dropped
                }
                notify();
            }
            tracing::debug!("Remote worker stopped");
        });

        Self {
            requests: request_tx,
            completions: completion_rx,
            stopped: false,
        }
    }

    /// Queue a request. Hands it back if the worker thread is gone.
    pub fn submit(&self, request: RemoteRequest) -> Result<(), RemoteRequest> {
        self.requests.send(request).map_err(|e| e.0)
    }

    /// Completions that have arrived since the last poll (non-blocking)
    pub fn poll(&mut self) -> Vec<RemoteCompletion> {
        let mut done = Vec::new();
        loop {
            match self.completions.try_recv() {
                Ok(completion) => done.push(completion),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.stopped {
                        tracing::error!("Remote worker thread exited");
                        self.stopped = true;
                    }
                    break;
                }
            }
        }
        done
    }

    /// False once `poll` has seen the worker thread exit
    pub fn is_running(&self) -> bool {
        !self.stopped
    }
}
