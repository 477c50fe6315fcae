//! Development server: serves the output root and rebuilds on change.
//!
//! The server binds first and answers 503 until the initial build lands,
//! so the browser can be pointed at it straight away.

mod lifecycle;
mod path;
mod response;
mod watch;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::{
    cli::{Cli, build::build_assets},
    config::BundleConfig,
    core::{begin_update, end_update, is_busy, is_healthy, is_shutdown, set_healthy},
    log,
    logger::{status_error, status_success},
};

/// Request handler threads.
const REQUEST_THREADS: usize = 4;

/// How long a request waits for a running rebuild before getting a 503.
const BUSY_WAIT: Duration = Duration::from_secs(5);
const BUSY_POLL: Duration = Duration::from_millis(50);

/// Bind, build, watch and serve until Ctrl+C.
pub fn serve_assets(cli: &Cli, config: &BundleConfig) -> Result<()> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);
    log!("serve"; "http://{}", display_addr(addr));

    let watcher = if config.serve.watch {
        Some(watch::spawn(cli.clone(), config, shutdown_rx)?)
    } else {
        None
    };

    let initial = config.clone();
    thread::spawn(move || initial_build(&initial));

    run_request_loop(&server, &config.output_dir())?;
    lifecycle::wait_for_shutdown(watcher);
    Ok(())
}

fn initial_build(config: &BundleConfig) {
    begin_update();
    let result = build_assets(config, false);
    end_update();

    match result {
        Ok(_) => {
            set_healthy(true);
            if config.serve.watch {
                status_success("ready, watching for changes");
            }
        }
        Err(err) => {
            set_healthy(false);
            status_error("build failed", &format!("{err:#}"));
        }
    }
}

/// `0.0.0.0` is not browsable; show `localhost` for it.
fn display_addr(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("localhost:{}", addr.port())
    } else {
        addr.to_string()
    }
}

fn run_request_loop(server: &Server, output: &Path) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .build()?;

    for request in server.incoming_requests() {
        let output = output.to_path_buf();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &output) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

fn handle_request(request: Request, output: &Path) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }
    if !wait_until_idle() {
        return response::respond_rebuilding(request);
    }

    if let Some(path) = path::resolve_path(request.url(), output) {
        return response::respond_file(request, &path);
    }
    if !is_healthy() {
        return response::respond_build_failed(request);
    }
    response::respond_not_found(request, output)
}

/// Block while a rebuild runs. `false` if it outlasted `BUSY_WAIT`.
fn wait_until_idle() -> bool {
    let mut waited = Duration::ZERO;
    while is_busy() {
        if waited >= BUSY_WAIT || is_shutdown() {
            return false;
        }
        thread::sleep(BUSY_POLL);
        waited += BUSY_POLL;
    }
    true
}
