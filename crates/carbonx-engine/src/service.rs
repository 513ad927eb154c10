//! Single-writer exchange service.
//!
//! [`ExchangeService`] runs an [`Engine`] on one tokio task and feeds it
//! from a bounded `mpsc` queue. Concurrent callers hold cloned
//! [`ExchangeHandle`]s and await their result on a `oneshot` reply, so the
//! whole reserve-match-settle sequence of one command is never interleaved
//! with another.
//!
//! The worker stops once every handle is dropped and hands the engine back.

use carbonx_matchcore::DepthLevel;
use carbonx_types::{AccountId, Asset, Balance, CarbonxError, Command, Receipt, Result, Side};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::Engine;
use crate::journal::AuditSink;

enum Request {
    Execute {
        caller: AccountId,
        command: Command,
        reply: oneshot::Sender<Result<Receipt>>,
    },
    Balance {
        account: AccountId,
        asset: Asset,
        reply: oneshot::Sender<Balance>,
    },
    Depth {
        side: Side,
        levels: usize,
        reply: oneshot::Sender<Vec<DepthLevel>>,
    },
}

/// Cloneable client side of the service queue.
#[derive(Debug, Clone)]
pub struct ExchangeHandle {
    tx: mpsc::Sender<Request>,
}

impl ExchangeHandle {
    /// Submit a command and wait for its receipt.
    ///
    /// # Errors
    /// The engine's rejection, or `ServiceUnavailable` if the worker is gone.
    pub async fn execute(&self, caller: AccountId, command: Command) -> Result<Receipt> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Execute {
            caller,
            command,
            reply,
        })
        .await?;
        rx.await.map_err(|_| CarbonxError::ServiceUnavailable)?
    }

    pub async fn balance(&self, account: AccountId, asset: Asset) -> Result<Balance> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Balance {
            account,
            asset,
            reply,
        })
        .await?;
        rx.await.map_err(|_| CarbonxError::ServiceUnavailable)
    }

    pub async fn depth(&self, side: Side, levels: usize) -> Result<Vec<DepthLevel>> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Depth {
            side,
            levels,
            reply,
        })
        .await?;
        rx.await.map_err(|_| CarbonxError::ServiceUnavailable)
    }

    async fn send(&self, request: Request) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| CarbonxError::ServiceUnavailable)
    }
}

/// Owns the engine and drains the command queue.
pub struct ExchangeService<S: AuditSink> {
    engine: Engine<S>,
    rx: mpsc::Receiver<Request>,
}

impl<S: AuditSink + Send + 'static> ExchangeService<S> {
    /// Wrap `engine`; the queue capacity comes from its config.
    #[must_use]
    pub fn new(engine: Engine<S>) -> (Self, ExchangeHandle) {
        let (tx, rx) = mpsc::channel(engine.config().command_queue_capacity);
        (Self { engine, rx }, ExchangeHandle { tx })
    }

    /// Spawn the worker on the current runtime.
    pub fn spawn(engine: Engine<S>) -> (ExchangeHandle, JoinHandle<Engine<S>>) {
        let (service, handle) = Self::new(engine);
        (handle, tokio::spawn(service.run()))
    }

    /// Process requests until every handle is dropped, then return the engine.
    pub async fn run(mut self) -> Engine<S> {
        info!(
            capacity = self.engine.config().command_queue_capacity,
            "exchange service started"
        );
        let mut processed = 0u64;
        while let Some(request) = self.rx.recv().await {
            match request {
                Request::Execute {
                    caller,
                    command,
                    reply,
                } => {
                    let result = self.engine.execute(&caller, command);
                    processed += 1;
                    if reply.send(result).is_err() {
                        debug!(caller = %caller, "caller went away before the reply");
                    }
                }
                Request::Balance {
                    account,
                    asset,
                    reply,
                } => {
                    let _ = reply.send(self.engine.balance(&account, asset));
                }
                Request::Depth {
                    side,
                    levels,
                    reply,
                } => {
                    let _ = reply.send(self.engine.depth(side, levels));
                }
            }
        }
        info!(processed, "exchange service stopped");
        self.engine
    }
}
