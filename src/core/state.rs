//! Process-wide serve state.
//!
//! Three orthogonal flags:
//! - `HEALTHY`: did the last build succeed?
//! - `BUSY`: is a rebuild in progress? (requests wait for it)
//! - `SHUTDOWN`: has Ctrl+C been received?

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Last build succeeded and the output root is complete.
static HEALTHY: AtomicBool = AtomicBool::new(false);

/// A rebuild is running.
static BUSY: AtomicBool = AtomicBool::new(false);

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal for the watcher thread
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

// =============================================================================
// HEALTHY state
// =============================================================================

pub fn is_healthy() -> bool {
    HEALTHY.load(Ordering::SeqCst)
}

pub fn set_healthy(healthy: bool) {
    HEALTHY.store(healthy, Ordering::SeqCst);
}

// =============================================================================
// BUSY state
// =============================================================================

pub fn is_busy() -> bool {
    BUSY.load(Ordering::Acquire)
}

/// Mark a rebuild as started
pub fn begin_update() {
    BUSY.store(true, Ordering::Release);
}

/// Mark a rebuild as finished
pub fn end_update() {
    BUSY.store(false, Ordering::Release);
}

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// Install the Ctrl+C handler. Call once at program start.
///
/// Before `register_server()` the process exits immediately; afterwards the
/// server is unblocked and the watcher notified so both loops end cleanly.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }

        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server and watcher channel for graceful shutdown.
pub fn register_server(server: Arc<Server>, shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
