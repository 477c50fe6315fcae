//! Server lifecycle: binding, shutdown and joining the watcher.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{Result, anyhow};
use crossbeam::channel::Sender;
use tiny_http::Server;

use crate::{core::register_server, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to `interface`, trying successive ports from `base_port`.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let Some(port) = base_port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::new(interface, port);
        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(err) => last_error = Some(err),
        }
    }

    let cause = last_error.map(|e| e.to_string()).unwrap_or_default();
    Err(anyhow!(
        "failed to bind {} after {} attempts from port {}: {}",
        interface,
        MAX_PORT_RETRIES,
        base_port,
        cause
    ))
}

/// Hand the server and watcher channel to the Ctrl+C handler.
pub fn register_server_for_shutdown(server: Arc<Server>, shutdown_tx: Sender<()>) {
    register_server(server, shutdown_tx);
}

/// Give the watcher up to two seconds to finish its current rebuild.
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_bind_retries_next_port() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let (first, addr) = bind_with_retry(localhost, 0).unwrap();
        // port 0 picks an ephemeral port; bind a second server on the one it got
        let taken = first.server_addr().to_ip().map(|a| a.port()).unwrap();
        assert_eq!(addr.port(), 0);

        let (_second, next) = bind_with_retry(localhost, taken).unwrap();
        assert_ne!(next.port(), taken);
        assert!(next.port() > taken);
    }
}
