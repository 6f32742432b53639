//! Service runtime
//!
//! One cooperative loop drives connection supervision, interval-gated
//! polling and command handling in strict sequence; remote calls are awaited
//! inline and nothing preempts them, so the store and link state need no
//! locking. Commands arrive over an mpsc channel with oneshot replies and
//! are thin adapters over the poller, writer and supervisor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::TagCatalog;
use crate::error::{Result, TagSrvError};
use crate::poller::BatchReader;
use crate::store::{CurrentValueStore, TagValue};
use crate::supervisor::ConnectionSupervisor;
use crate::writer::TagWriter;

/// How long the loop parks waiting for a command before re-running
/// supervision and polling.
const LOOP_SLICE: Duration = Duration::from_millis(50);

/// Commands accepted by the runtime; the external dispatcher is out of
/// scope, these are its in-process surface.
pub enum RuntimeCommand {
    PollNow {
        reply: oneshot::Sender<Result<()>>,
    },
    WriteTag {
        name: String,
        value: f64,
        reply: oneshot::Sender<Result<()>>,
    },
    GetStatus {
        reply: oneshot::Sender<ServiceStatus>,
    },
    ForceReconnect,
}

/// Point-in-time view of the service.
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub connected: bool,
    pub retry_count: u32,
    pub last_poll: Option<DateTime<Utc>>,
    /// Positional snapshot of the current-value store
    pub values: Vec<Option<TagValue>>,
}

/// Cloneable command-side handle to a running [`TagRuntime`].
#[derive(Clone)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<RuntimeCommand>,
}

impl RuntimeHandle {
    pub async fn poll_now(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(RuntimeCommand::PollNow { reply }).await?;
        rx.await
            .map_err(|_| TagSrvError::internal("runtime stopped"))?
    }

    pub async fn write_tag(&self, name: impl Into<String>, value: f64) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(RuntimeCommand::WriteTag {
            name: name.into(),
            value,
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| TagSrvError::internal("runtime stopped"))?
    }

    pub async fn status(&self) -> Result<ServiceStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(RuntimeCommand::GetStatus { reply }).await?;
        rx.await
            .map_err(|_| TagSrvError::internal("runtime stopped"))
    }

    pub async fn force_reconnect(&self) -> Result<()> {
        self.send(RuntimeCommand::ForceReconnect).await
    }

    async fn send(&self, cmd: RuntimeCommand) -> Result<()> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| TagSrvError::internal("runtime stopped"))
    }
}

pub struct TagRuntime {
    supervisor: ConnectionSupervisor,
    reader: BatchReader,
    writer: TagWriter,
    store: CurrentValueStore,
    poll_interval: Duration,
    last_poll: Option<Instant>,
    last_poll_wall: Option<DateTime<Utc>>,
    rx: mpsc::Receiver<RuntimeCommand>,
}

impl TagRuntime {
    pub fn new(
        catalog: Arc<TagCatalog>,
        supervisor: ConnectionSupervisor,
        poll_interval: Duration,
    ) -> (Self, RuntimeHandle) {
        let (tx, rx) = mpsc::channel(16);
        let store = CurrentValueStore::new(catalog.len());
        let runtime = Self {
            supervisor,
            reader: BatchReader::new(catalog.clone()),
            writer: TagWriter::new(catalog),
            store,
            poll_interval,
            last_poll: None,
            last_poll_wall: None,
            rx,
        };
        (runtime, RuntimeHandle { tx })
    }

    /// Run until cancelled. Each iteration: supervise the link, poll if due,
    /// then wait one slice for a command.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(poll_interval = ?self.poll_interval, "tag runtime started");
        loop {
            let now = Instant::now();
            self.supervisor.tick(now).await;

            if self.supervisor.is_connected() && self.poll_due(now) {
                if let Err(e) = self.poll_once().await {
                    warn!(error = %e, "poll failed");
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                _ = tokio::time::sleep(LOOP_SLICE) => {}
            }
        }
        info!("tag runtime stopped");
    }

    fn poll_due(&self, now: Instant) -> bool {
        self.last_poll
            .map_or(true, |t| now.duration_since(t) >= self.poll_interval)
    }

    async fn poll_once(&mut self) -> Result<()> {
        self.reader
            .poll_all(self.supervisor.service_mut(), &mut self.store)
            .await?;
        self.last_poll = Some(Instant::now());
        self.last_poll_wall = Some(Utc::now());
        Ok(())
    }

    async fn handle_command(&mut self, cmd: RuntimeCommand) {
        match cmd {
            RuntimeCommand::PollNow { reply } => {
                let result = if self.supervisor.is_connected() {
                    self.poll_once().await
                } else {
                    Err(TagSrvError::not_connected())
                };
                let _ = reply.send(result);
            }
            RuntimeCommand::WriteTag { name, value, reply } => {
                let result = if self.supervisor.is_connected() {
                    self.writer
                        .write_tag(self.supervisor.service_mut(), &mut self.store, &name, value)
                        .await
                } else {
                    Err(TagSrvError::not_connected())
                };
                let _ = reply.send(result);
            }
            RuntimeCommand::GetStatus { reply } => {
                let _ = reply.send(ServiceStatus {
                    connected: self.supervisor.is_connected(),
                    retry_count: self.supervisor.retry_count(),
                    last_poll: self.last_poll_wall,
                    values: self.store.snapshot(),
                });
            }
            RuntimeCommand::ForceReconnect => {
                self.supervisor.force_reconnect().await;
            }
        }
    }
}
