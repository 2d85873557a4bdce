//! Service host: one worker thread owning the store.
//!
//! # Responsibility
//! - Own the [`Dispatcher`] on a dedicated thread so storage access is
//!   serialized in arrival order.
//! - Hand out cloneable [`HostHandle`]s for async callers.
//!
//! # Invariants
//! - The worker exits on `Shutdown` or once every sender is gone.
//! - A caller that dropped its reply receiver never stalls the worker.
//! - A request whose caller is already gone when it is dequeued is not
//!   dispatched, so an abandoned write does not commit.

use super::dispatch::Dispatcher;
use crate::config::{ServiceConfig, StorageBackend};
use crate::db::DbError;
use crate::repo::memory_store::MemoryStore;
use crate::repo::sqlite_store::SqliteStore;
use crate::repo::Store;
use crate::service::PersistenceService;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

const WORKER_THREAD_NAME: &str = "studynote-service";

#[derive(Debug)]
pub enum HostError {
    /// Storage could not be opened for the worker.
    Db(DbError),
    /// Worker thread could not be started.
    Spawn(std::io::Error),
    /// Worker stopped before answering.
    Closed,
    /// Worker thread panicked.
    WorkerPanicked,
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "failed to open storage: {err}"),
            Self::Spawn(err) => write!(f, "failed to start service worker: {err}"),
            Self::Closed => write!(f, "service worker is not running"),
            Self::WorkerPanicked => write!(f, "service worker panicked"),
        }
    }
}

impl Error for HostError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for HostError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

enum HostMessage {
    Request {
        frame: String,
        reply: oneshot::Sender<String>,
    },
    Shutdown,
}

/// Cloneable sender side of a running host.
#[derive(Clone)]
pub struct HostHandle {
    tx: mpsc::UnboundedSender<HostMessage>,
}

impl HostHandle {
    /// Sends one request frame and awaits its response frame.
    pub async fn call(&self, frame: String) -> Result<String, HostError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(HostMessage::Request { frame, reply })
            .map_err(|_| HostError::Closed)?;
        response.await.map_err(|_| HostError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Running worker thread plus the handle used to reach it.
pub struct ServiceHost {
    handle: HostHandle,
    worker: Option<JoinHandle<()>>,
}

impl ServiceHost {
    /// Starts the worker thread with a service over `store`.
    pub fn spawn<S: Store + 'static>(store: S) -> Result<Self, HostError> {
        let (tx, rx) = mpsc::unbounded_channel::<HostMessage>();
        let dispatcher = Dispatcher::new(PersistenceService::new(store));

        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || serve(rx, dispatcher))
            .map_err(HostError::Spawn)?;

        Ok(Self {
            handle: HostHandle { tx },
            worker: Some(worker),
        })
    }

    /// Opens the configured backend and starts a host over it.
    pub fn spawn_from_config(config: &ServiceConfig) -> Result<Self, HostError> {
        match &config.storage {
            StorageBackend::Memory => Self::spawn(MemoryStore::new()),
            StorageBackend::Sqlite(path) => Self::spawn(SqliteStore::open(path)?),
        }
    }

    pub fn handle(&self) -> HostHandle {
        self.handle.clone()
    }

    /// Stops the worker after already queued requests and waits for it.
    pub fn shutdown(mut self) -> Result<(), HostError> {
        let _ = self.handle.tx.send(HostMessage::Shutdown);
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| HostError::WorkerPanicked),
            None => Ok(()),
        }
    }
}

fn serve<S: Store>(mut rx: mpsc::UnboundedReceiver<HostMessage>, mut dispatcher: Dispatcher<S>) {
    log::info!("event=host_start module=ipc status=ok");
    while let Some(message) = rx.blocking_recv() {
        match message {
            HostMessage::Request { frame, reply } => {
                if reply.is_closed() {
                    log::debug!("event=host_request module=ipc status=dropped reason=caller_gone");
                    continue;
                }
                let response = dispatcher.handle_frame(&frame);
                if reply.send(response).is_err() {
                    log::debug!("event=host_reply module=ipc status=dropped reason=caller_gone");
                }
            }
            HostMessage::Shutdown => break,
        }
    }
    log::info!("event=host_stop module=ipc status=ok");
}

impl Drop for ServiceHost {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.handle.tx.send(HostMessage::Shutdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{serve, HostHandle, HostMessage};
    use crate::ipc::client::{ClientError, ServiceClient};
    use crate::ipc::dispatch::Dispatcher;
    use crate::repo::memory_store::MemoryStore;
    use crate::service::PersistenceService;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn timed_out_write_is_not_applied() {
        let (tx, rx) = mpsc::unbounded_channel::<HostMessage>();
        let client = ServiceClient::new(HostHandle { tx });

        // Nothing is serving yet, so the register stays queued past the bound.
        let impatient = client.clone().with_timeout(Some(Duration::from_millis(20)));
        let err = impatient.register("bob", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));

        let dispatcher = Dispatcher::new(PersistenceService::new(MemoryStore::new()));
        let worker = std::thread::spawn(move || serve(rx, dispatcher));

        assert!(matches!(
            client.login("bob", "pw").await.unwrap_err(),
            ClientError::InvalidCredentials
        ));
        let user = client.register("bob", "pw").await.unwrap();
        assert_eq!(user.username, "bob");

        drop(impatient);
        drop(client);
        worker.join().unwrap();
    }

    #[tokio::test]
    async fn calls_without_a_worker_report_closed() {
        let (tx, rx) = mpsc::unbounded_channel::<HostMessage>();
        drop(rx);
        let handle = HostHandle { tx };
        assert!(handle.is_closed());
        assert!(handle.call("{}".to_string()).await.is_err());
    }
}
