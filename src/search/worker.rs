//! Background lookup worker.
//!
//! The UI thread never blocks on the search backend: requests go to a worker
//! thread over a channel and responses come back tagged with their sequence
//! number. While idle the worker polls the backend's data version and reports
//! changes so the palette can re-issue its live query.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use tracing::{debug, warn};

use crate::search::dispatch::{LookupRequest, LookupResponse};
use crate::search::provider::{LookupError, SearchProvider};

/// Something the palette can hear back from its backend.
#[derive(Debug)]
pub enum BackendEvent {
    Response(LookupResponse),
    /// Underlying data changed; live queries should be re-issued.
    DataChanged,
}

/// Asynchronous transport between the palette and a search capability.
pub trait LookupBackend {
    fn submit(&self, request: LookupRequest);

    /// Next pending event, without blocking.
    fn try_next(&self) -> Option<BackendEvent>;
}

enum WorkerCommand {
    Lookup(LookupRequest),
    Shutdown,
}

pub struct LookupWorker {
    tx: Sender<WorkerCommand>,
    rx: Receiver<BackendEvent>,
    handle: Option<JoinHandle<()>>,
}

impl LookupWorker {
    /// Spawn a worker that builds its provider on the worker thread.
    ///
    /// Building on the worker keeps non-`Sync` providers (a `SQLite`
    /// connection) owned by a single thread.
    pub fn spawn<P, F>(factory: F, watch_interval: Duration) -> Self
    where
        P: SearchProvider,
        F: FnOnce() -> Result<P, LookupError> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = unbounded::<WorkerCommand>();
        let (evt_tx, evt_rx) = unbounded::<BackendEvent>();
        let handle = thread::Builder::new()
            .name("folio-lookup".into())
            .spawn(move || run_worker(factory, cmd_rx, evt_tx, watch_interval))
            .ok();
        if handle.is_none() {
            warn!("failed to spawn lookup worker; lookups will resolve empty");
        }
        Self {
            tx: cmd_tx,
            rx: evt_rx,
            handle,
        }
    }

    /// Block until the next event or `timeout`. Used by one-shot callers.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<BackendEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl LookupBackend for LookupWorker {
    fn submit(&self, request: LookupRequest) {
        let seq = request.seq;
        if self.tx.send(WorkerCommand::Lookup(request)).is_err() {
            warn!(seq, "lookup worker gone; request dropped");
        }
    }

    fn try_next(&self) -> Option<BackendEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

impl Drop for LookupWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker<P, F>(
    factory: F,
    rx: Receiver<WorkerCommand>,
    tx: Sender<BackendEvent>,
    watch_interval: Duration,
) where
    P: SearchProvider,
    F: FnOnce() -> Result<P, LookupError>,
{
    let provider = match factory() {
        Ok(p) => Some(p),
        Err(err) => {
            warn!(error = %err, "search backend unavailable");
            None
        }
    };
    let mut last_version = provider.as_ref().and_then(|p| p.data_version().ok());

    loop {
        match rx.recv_timeout(watch_interval) {
            Ok(WorkerCommand::Lookup(request)) => {
                // Only the newest queued request matters; older ones would be
                // discarded as stale by the dispatcher anyway.
                let mut request = request;
                let mut shutdown = false;
                while let Ok(cmd) = rx.try_recv() {
                    match cmd {
                        WorkerCommand::Lookup(newer) => request = newer,
                        WorkerCommand::Shutdown => shutdown = true,
                    }
                }
                if shutdown {
                    break;
                }
                let outcome = match &provider {
                    Some(p) => p.search(&request.key.term, &request.key.identity),
                    None => Err(LookupError::Unavailable("no search backend".into())),
                };
                debug!(seq = request.seq, ok = outcome.is_ok(), "lookup finished");
                let response = LookupResponse {
                    seq: request.seq,
                    outcome,
                };
                if tx.send(BackendEvent::Response(response)).is_err() {
                    break;
                }
            }
            Ok(WorkerCommand::Shutdown) => break,
            Err(RecvTimeoutError::Timeout) => {
                let Some(p) = &provider else { continue };
                match p.data_version() {
                    Ok(v) if Some(v) != last_version => {
                        debug!(version = v, "search data changed");
                        last_version = Some(v);
                        if tx.send(BackendEvent::DataChanged).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => debug!(error = %err, "data version probe failed"),
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("lookup worker stopped");
}
