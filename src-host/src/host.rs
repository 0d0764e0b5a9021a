//! Host message loop

use igswap_core::{Response, WorkerHandle};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::messaging::{read_message, write_message, MessagingError};

/// Answer messages from `reader` on `writer` until the browser hangs up.
///
/// Malformed JSON and oversized responses are answered with `{error}`; only
/// transport failures end the loop with an error.
pub async fn serve<R, W>(
    mut reader: R,
    mut writer: W,
    handle: WorkerHandle,
) -> Result<(), MessagingError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut handled: u64 = 0;

    loop {
        let message = match read_message(&mut reader).await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(MessagingError::Json(e)) => {
                tracing::warn!(error = %e, "Discarding malformed message");
                write_message(&mut writer, &Response::error(format!("Malformed message: {}", e)))
                    .await?;
                continue;
            }
            Err(e) => return Err(e),
        };

        let response = handle.call_value(message).await;
        handled += 1;

        match write_message(&mut writer, &response).await {
            Ok(()) => {}
            Err(MessagingError::TooLarge { size, limit }) => {
                tracing::error!(size, limit, "Response exceeds native messaging limit");
                write_message(&mut writer, &Response::error("Response too large")).await?;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::debug!(handled, "Message loop finished");
    Ok(())
}
