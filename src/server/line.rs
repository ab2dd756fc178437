//! # Line-Socket Front End
//!
//! One command per connection: the client writes a command, the server
//! writes back the plain reply text and closes.

use bytes::BytesMut;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::SessionController;
use crate::error::Result;

/// Largest command read from a connection
pub const MAX_COMMAND_LEN: u64 = 1024;

/// Accept connections on `listener` until `cancel` fires
///
/// A connection that sends nothing within `read_timeout` is closed unanswered.
pub async fn serve(
    listener: TcpListener,
    controller: Arc<SessionController>,
    read_timeout: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Line command server listening on {}", addr);
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Line command server shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(connection) => connection,
                    Err(e) => {
                        warn!("Failed to accept line connection: {}", e);
                        continue;
                    }
                };

                let controller = controller.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, &controller, read_timeout).await {
                        debug!("Line connection from {} failed: {}", peer, e);
                    }
                });
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    controller: &SessionController,
    read_timeout: Duration,
) -> Result<()> {
    let mut buf = BytesMut::with_capacity(MAX_COMMAND_LEN as usize);
    let mut limited = (&mut stream).take(MAX_COMMAND_LEN);
    let read = limited.read_buf(&mut buf);
    let Ok(read) = timeout(read_timeout, read).await else {
        debug!("Line connection idle for {:?}, closing", read_timeout);
        return Ok(());
    };
    read?;
    if buf.is_empty() {
        return Ok(());
    }

    let line = String::from_utf8_lossy(&buf);
    let reply = controller.handle_line(line.trim()).await;

    stream.write_all(reply.to_string().as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}
