//! Dispatch Module
//!
//! Accepts connections, decodes one request per connection, runs the
//! mediator operation under the request's deadline, and replies.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, error, info, warn};

use crate::error::{RelayError, Result};
use crate::mediator::WikiRelay;
use crate::server::protocol::{
    ByeEnvelope, Payload, ResultEnvelope, WireRequest, EXECUTION_FAILED, INTERRUPTED,
    INVALID_OPERATION, TIMED_OUT,
};

// == Relay Server ==
/// TCP front end for a shared [`WikiRelay`].
///
/// Each accepted connection is handled by its own task holding a permit
/// from the worker-pool semaphore; excess connections queue for a permit.
/// A `stop` request raises the shared stop flag, which the accept loop
/// observes on its next iteration; in-flight connections finish
/// undisturbed.
pub struct RelayServer {
    listener: TcpListener,
    relay: Arc<WikiRelay>,
    permits: Arc<Semaphore>,
    stop: Arc<Notify>,
}

impl RelayServer {
    // == Bind ==
    /// Binds the listener. This is the only fatal failure point of the
    /// dispatch layer.
    pub async fn bind(addr: SocketAddr, relay: Arc<WikiRelay>, max_concurrent: usize) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            relay,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            stop: Arc::new(Notify::new()),
        })
    }

    /// The address the listener actually bound (port 0 resolves here).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    // == Serve ==
    /// Runs the accept loop until a `stop` request is processed.
    pub async fn serve(self) -> Result<()> {
        info!(addr = %self.local_addr()?, "relay server listening");

        loop {
            tokio::select! {
                _ = self.stop.notified() => {
                    info!("stop requested, closing listener");
                    break;
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!(error = %e, "failed to accept connection");
                            continue;
                        }
                    };
                    let permit = match self.permits.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    debug!(%peer, "connection accepted");

                    let relay = Arc::clone(&self.relay);
                    let stop = Arc::clone(&self.stop);
                    tokio::spawn(async move {
                        let _permit = permit;
                        if let Err(e) = handle_connection(stream, relay, stop).await {
                            warn!(%peer, error = %e, "connection failed");
                        }
                    });
                }
            }
        }
        Ok(())
    }
}

// == Connection Handling ==
/// Reads one request, dispatches it, writes one newline-terminated reply.
async fn handle_connection(
    stream: TcpStream,
    relay: Arc<WikiRelay>,
    stop: Arc<Notify>,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        // Client went away without sending a request.
        return Ok(());
    }

    let reply = match serde_json::from_str::<WireRequest>(line.trim()) {
        Ok(request) => dispatch(relay, stop, request).await?,
        Err(e) => {
            warn!(error = %e, "malformed request");
            let id = salvage_id(&line);
            serde_json::to_string(&ResultEnvelope::failed(id, INVALID_OPERATION))?
        }
    };

    write_half.write_all(reply.as_bytes()).await?;
    write_half.write_all(b"\n").await?;
    Ok(())
}

/// Pulls the echo token out of a request that failed to decode, so the
/// failure reply can still be correlated.
fn salvage_id(line: &str) -> String {
    serde_json::from_str::<serde_json::Value>(line.trim())
        .ok()
        .and_then(|value| value.get("id")?.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// A request is dispatchable when its operation is recognized and its
/// required parameters are present.
fn recognized(request: &WireRequest) -> bool {
    match request.op.as_str() {
        "search" => request.query.is_some(),
        "getPage" => request.page_title.is_some(),
        "zeitgeist" | "trending" | "peakLoad30s" => true,
        _ => false,
    }
}

// == Dispatch ==
/// Runs one request to a serialized reply.
///
/// Recognized operations run in a spawned worker so the deadline can be
/// enforced from outside; on expiry the worker is aborted (best-effort)
/// and the timeout reply goes out immediately.
async fn dispatch(relay: Arc<WikiRelay>, stop: Arc<Notify>, request: WireRequest) -> Result<String> {
    if request.op == "stop" {
        if let Err(e) = relay.persist().await {
            warn!(error = %e, "failed to persist statistics on stop");
        }
        stop.notify_one();
        return Ok(serde_json::to_string(&ByeEnvelope::new(request.id))?);
    }

    if !recognized(&request) {
        debug!(op = %request.op, "unrecognized request");
        return Ok(serde_json::to_string(&ResultEnvelope::failed(
            request.id,
            INVALID_OPERATION,
        ))?);
    }

    let id = request.id.clone();
    let timeout = request.timeout;
    let mut worker = tokio::spawn(invoke(relay, request));

    let outcome = match timeout {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), &mut worker).await {
            Ok(joined) => settle(joined),
            Err(_) => {
                // Best-effort cancellation: stop waiting now, the worker
                // is told to wind down.
                worker.abort();
                Err(RelayError::Timeout)
            }
        },
        None => settle((&mut worker).await),
    };

    let envelope = match outcome {
        Ok(payload) => ResultEnvelope::success(id, payload),
        Err(e) => {
            warn!(%id, error = %e, "request failed");
            ResultEnvelope::failed(id, failure_reason(&e))
        }
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Collapses a worker join outcome into the operation result.
fn settle(joined: std::result::Result<Result<Payload>, tokio::task::JoinError>) -> Result<Payload> {
    match joined {
        Ok(result) => result,
        Err(join_error) if join_error.is_cancelled() => Err(RelayError::Interrupted),
        Err(join_error) => {
            error!(error = %join_error, "worker crashed");
            Err(RelayError::ExecutionFailed(join_error.to_string()))
        }
    }
}

/// Wire reason for a failed operation.
fn failure_reason(error: &RelayError) -> &'static str {
    match error {
        RelayError::InvalidOperation(_) => INVALID_OPERATION,
        RelayError::Timeout => TIMED_OUT,
        RelayError::Interrupted => INTERRUPTED,
        _ => EXECUTION_FAILED,
    }
}

/// Maps one recognized request onto the mediator.
async fn invoke(relay: Arc<WikiRelay>, request: WireRequest) -> Result<Payload> {
    match request.op.as_str() {
        "search" => relay
            .search(request.query.as_deref().unwrap_or_default(), request.limit)
            .await
            .map(Payload::Titles),
        "getPage" => relay
            .get_page(request.page_title.as_deref().unwrap_or_default())
            .await
            .map(Payload::Text),
        "zeitgeist" => Ok(Payload::Titles(relay.zeitgeist(request.limit).await)),
        "trending" => Ok(Payload::Titles(relay.trending(request.limit).await)),
        "peakLoad30s" => Ok(Payload::Text(relay.peak_load_30s().await.to_string())),
        other => Err(RelayError::InvalidOperation(other.to_string())),
    }
}
