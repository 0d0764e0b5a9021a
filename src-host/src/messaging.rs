//! Native messaging framing
//!
//! Each message is a 32-bit length in native byte order followed by that many
//! bytes of UTF-8 JSON.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest message the browser may send to a host
pub const MAX_INBOUND: usize = 64 * 1024 * 1024;
/// Largest message a host may send to the browser
pub const MAX_OUTBOUND: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
}

/// Read one message. `Ok(None)` means the browser closed the channel.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Value>, MessagingError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        match reader.read(&mut len_buf[filled..]).await? {
            0 if filled == 0 => return Ok(None),
            0 => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("channel closed after {} of 4 header bytes", filled),
                )
                .into())
            }
            n => filled += n,
        }
    }

    let size = u32::from_ne_bytes(len_buf) as usize;
    if size > MAX_INBOUND {
        return Err(MessagingError::TooLarge {
            size,
            limit: MAX_INBOUND,
        });
    }

    let mut body = vec![0u8; size];
    reader.read_exact(&mut body).await?;

    Ok(Some(serde_json::from_slice(&body)?))
}

/// Write one message and flush it
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), MessagingError>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(message)?;
    if body.len() > MAX_OUTBOUND {
        return Err(MessagingError::TooLarge {
            size: body.len(),
            limit: MAX_OUTBOUND,
        });
    }

    writer.write_all(&(body.len() as u32).to_ne_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}
