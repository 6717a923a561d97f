// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bell_core::{BlastId, Clock, IdGen};
use bell_engine::{CreateBlast, Lifecycle, LifecycleError, ListBlasts, MarkDone, React};
use bell_storage::EntityStore;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{debug, error, info};

use crate::protocol::{self, Request, Response, PROTOCOL_VERSION};

/// Everything a connection task needs; cheap to clone into each task
pub struct ServerContext<S, C, I> {
    pub lifecycle: Lifecycle<S, C, I>,
    pub start_time: Instant,
    pub ipc_timeout: Duration,
    /// Notified once when a client asks the daemon to stop
    pub shutdown: Arc<Notify>,
}

impl<S: Clone, C: Clone, I: Clone> Clone for ServerContext<S, C, I> {
    fn clone(&self) -> Self {
        Self {
            lifecycle: self.lifecycle.clone(),
            start_time: self.start_time,
            ipc_timeout: self.ipc_timeout,
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

/// Accept connections until a client requests shutdown
///
/// Each connection runs on its own task, so slow clients never block others.
pub async fn serve<S, C, I>(listener: &UnixListener, ctx: &ServerContext<S, C, I>)
where
    S: EntityStore,
    C: Clock,
    I: IdGen,
{
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let ctx = ctx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(&ctx, stream).await {
                                error!("Error handling connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                }
            }

            _ = ctx.shutdown.notified() => {
                info!("Shutdown requested via IPC");
                return;
            }
        }
    }
}

/// Serve a single request/response exchange on `stream`
pub async fn handle_connection<S, C, I, T>(
    ctx: &ServerContext<S, C, I>,
    stream: T,
) -> Result<(), ServerError>
where
    S: EntityStore,
    C: Clock,
    I: IdGen,
    T: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    let request = match protocol::read_request(&mut reader, ctx.ipc_timeout).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    let response = handle_request(ctx, request).await;

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, ctx.ipc_timeout)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request and return a response
pub async fn handle_request<S, C, I>(ctx: &ServerContext<S, C, I>, request: Request) -> Response
where
    S: EntityStore,
    C: Clock,
    I: IdGen,
{
    let lifecycle = &ctx.lifecycle;
    let result = match request {
        Request::Ping => Ok(Response::Pong),

        Request::Hello { version: _ } => Ok(Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        }),

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Ok(Response::ShuttingDown)
        }

        Request::Status => lifecycle.status_counts().await.map(|counts| Response::Status {
            uptime_secs: ctx.start_time.elapsed().as_secs(),
            blasts_open: counts.open,
            blasts_claimed: counts.claimed,
            blasts_done: counts.done,
        }),

        Request::CreateBlast { body } => match CreateBlast::from_body(&body) {
            Ok(req) => lifecycle
                .create_blast(req)
                .await
                .map(|blast| Response::Blast {
                    blast: Box::new(blast),
                }),
            Err(e) => Err(e),
        },

        Request::ListBlasts {
            household_id,
            status,
        } => match ListBlasts::from_query(household_id.as_deref(), status.as_deref()) {
            Ok(req) => lifecycle
                .list_blasts(req)
                .await
                .map(|blasts| Response::Blasts { blasts }),
            Err(e) => Err(e),
        },

        Request::GetBlast { id } => lifecycle
            .get_blast(&BlastId(id))
            .await
            .map(|blast| Response::Blast {
                blast: Box::new(blast),
            }),

        Request::React { blast_id, body } => match React::from_body(&blast_id, &body) {
            Ok(req) => lifecycle
                .react(req)
                .await
                .map(|(reaction, blast)| Response::Reacted {
                    reaction,
                    blast: Box::new(blast),
                }),
            Err(e) => Err(e),
        },

        Request::MarkDone { blast_id, body } => match MarkDone::from_body(&blast_id, &body) {
            Ok(req) => lifecycle
                .mark_done(req)
                .await
                .map(|blast| Response::Blast {
                    blast: Box::new(blast),
                }),
            Err(e) => Err(e),
        },
    };

    result.unwrap_or_else(|e| error_response(&e))
}

fn error_response(error: &LifecycleError) -> Response {
    Response::Error {
        status: error.status_code(),
        error: error.to_string(),
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
