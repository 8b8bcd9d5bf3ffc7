// SPDX-License-Identifier: GPL-3.0-only

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_directives() -> String {
    let level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    format!("warn,cosmic_grab={level}")
}

pub fn init_logger() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives()));
    let term = fmt::layer().compact().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter).with(term);

    #[cfg(feature = "systemd")]
    let (registry, journald_err) = match tracing_journald::layer() {
        Ok(journald) => (registry.with(Some(journald)), None),
        Err(err) => (registry.with(None::<tracing_journald::Layer>), Some(err)),
    };

    registry.try_init()?;
    log_panics::init();

    #[cfg(feature = "systemd")]
    if let Some(err) = journald_err {
        tracing::warn!(?err, "Journald not reachable, logging to stderr only");
    }

    info!("Version: {}", std::env!("CARGO_PKG_VERSION"));
    if cfg!(debug_assertions) {
        debug!(
            "Debug build ({})",
            std::option_env!("GIT_HASH").unwrap_or("Unknown")
        );
    }

    Ok(())
}
