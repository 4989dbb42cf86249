use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};
use tracing::{debug, info, warn};

use crate::{
    commands::CommandHandler,
    resp::{CommandDecoder, RespError, RespValue, MAX_BULK_LENGTH},
    store::{ClientId, Store},
};

/// Unparsed input a client may have buffered at once: one maximal bulk string
/// plus room for the rest of the read that delivered it.
const MAX_PENDING_INPUT: usize = MAX_BULK_LENGTH + 64 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] RespError),
    #[error("{0} bytes of unparsed input exceed the limit")]
    InputTooLarge(usize),
}

/// Serves one client until it disconnects, then drops any blocking pops it
/// left behind.
pub async fn handle_client_connection(stream: TcpStream, client_id: ClientId, store: Arc<Store>) {
    let (mut reader, mut writer) = stream.into_split();

    let result = serve_client(&mut reader, &mut writer, client_id, &store).await;

    let removed = store.remove_client_waiters(client_id).await;
    if removed > 0 {
        debug!(client_id, removed, "removed waiters of disconnected client");
    }

    match result {
        Ok(()) => info!(client_id, "client disconnected"),
        Err(err) => warn!(client_id, error = %err, "closing client connection"),
    }
}

/// Reads commands from `reader` and writes their replies to `writer`.
///
/// Every complete frame in the buffer is executed before reading again, so
/// pipelined requests are answered in order with a single write.
pub async fn serve_client<R, W>(
    reader: &mut R,
    writer: &mut W,
    client_id: ClientId,
    store: &Store,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    serve_client_with_limit(reader, writer, client_id, store, MAX_PENDING_INPUT).await
}

async fn serve_client_with_limit<R, W>(
    reader: &mut R,
    writer: &mut W,
    client_id: ClientId,
    store: &Store,
    max_pending_input: usize,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut decoder = CommandDecoder::new();
    let mut buffer = BytesMut::with_capacity(4096);
    let mut output = BytesMut::with_capacity(4096);

    loop {
        loop {
            let command = match decoder.decode(&mut buffer) {
                Ok(Some(command)) => command,
                Ok(None) => break,
                Err(err) => {
                    err.as_resp().encode_to(&mut output);
                    writer.write_all(&output).await?;
                    return Err(err.into());
                }
            };

            let handler = CommandHandler::new(command);

            if !handler.is_blocking() {
                handler.execute(client_id, store).await.encode_to(&mut output);
                continue;
            }

            // Earlier replies should not wait behind a blocked command.
            if !output.is_empty() {
                writer.write_all(&output).await?;
                output.clear();
            }

            let reply = execute_blocking(
                &handler,
                reader,
                &mut buffer,
                client_id,
                store,
                max_pending_input,
            )
            .await?;

            match reply {
                Some(reply) => reply.encode_to(&mut output),
                None => return Ok(()),
            }
        }

        if !output.is_empty() {
            writer.write_all(&output).await?;
            output.clear();
        }

        let pending = buffer.len() + decoder.held_len();
        if pending >= max_pending_input {
            return Err(ConnectionError::InputTooLarge(pending));
        }

        if reader.read_buf(&mut buffer).await? == 0 {
            if !buffer.is_empty() {
                debug!(client_id, pending = buffer.len(), "discarding partial frame");
            }

            return Ok(());
        }
    }
}

/// Runs a blocking command while watching the socket, so that a client that
/// disconnects mid-wait is noticed. Returns `None` on disconnect.
async fn execute_blocking<R>(
    handler: &CommandHandler,
    reader: &mut R,
    buffer: &mut BytesMut,
    client_id: ClientId,
    store: &Store,
    max_pending_input: usize,
) -> Result<Option<RespValue>, ConnectionError>
where
    R: AsyncRead + Unpin,
{
    let command = handler.execute(client_id, store);
    tokio::pin!(command);

    loop {
        tokio::select! {
            reply = &mut command => return Ok(Some(reply)),
            read = reader.read_buf(buffer), if buffer.len() < max_pending_input => {
                if read? == 0 {
                    debug!(client_id, command = %handler.name, "client disconnected while blocked");
                    return Ok(None);
                }
            }
        }
    }
}
