//! Serving side of the worker management protocol

use crate::codec::{read_frame, write_frame, ProtoError};
use crate::message::WorkerRequest;
use jmxgate_common::ResponseMap;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Answers decoded requests. Implementations never fail: every problem is
/// reported inside the returned map under `error`.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle(&self, request: WorkerRequest) -> ResponseMap;
}

/// Accept connections until `shutdown` is cancelled
pub async fn serve<H: RequestHandler>(
    listener: TcpListener,
    handler: Arc<H>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    info!("Serving management protocol on {}", listener.local_addr()?);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Management protocol server shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let handler = Arc::clone(&handler);
                let shutdown = shutdown.child_token();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = shutdown.cancelled() => {}
                        result = serve_connection(stream, handler) => {
                            if let Err(e) = result {
                                debug!("Connection from {} ended: {}", peer, e);
                            }
                        }
                    }
                });
            }
        }
    }
}

/// Answer requests on one connection until the peer hangs up
pub async fn serve_connection<H: RequestHandler>(
    stream: TcpStream,
    handler: Arc<H>,
) -> Result<(), ProtoError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    while let Some(request) = read_frame::<_, WorkerRequest>(&mut reader).await? {
        debug!("Handling '{}' request", request.command);
        let response = handler.handle(request);
        write_frame(&mut write_half, &response).await?;
    }

    Ok(())
}
