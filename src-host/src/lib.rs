//! igswap native messaging host
//!
//! The browser starts this process for the extension and talks to it over
//! stdio. Requests are decoded here and queued on the background worker;
//! the worker's responses are written back in request order.

mod host;
mod messaging;

pub use host::serve;
pub use messaging::{read_message, write_message, MessagingError, MAX_INBOUND, MAX_OUTBOUND};

use anyhow::Context;
use igswap_core::{spawn_worker, Background, Config};

pub fn run() -> anyhow::Result<()> {
    igswap_core::init_logging();

    let config = Config::load().context("failed to load configuration")?;
    let background = Background::new(config).context("failed to open background state")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let origin = std::env::args().nth(1).unwrap_or_default();
        tracing::info!(origin = %origin, "igswap host started");

        let handle = spawn_worker(background);
        serve(tokio::io::stdin(), tokio::io::stdout(), handle).await?;

        tracing::info!("Extension disconnected");
        Ok::<(), anyhow::Error>(())
    })
}
