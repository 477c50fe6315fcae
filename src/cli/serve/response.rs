//! HTTP response helpers.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime::{
    self,
    types::{HTML, PLAIN},
};

/// Seconds a client should wait before retrying a 503.
const RETRY_AFTER_SECS: &str = "1";

/// Serve a file from the output root.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = mime::from_path(path);
    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }
    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body)
}

/// 404, using the output root's `404.html` when the build emitted one.
pub fn respond_not_found(request: Request, output: &Path) -> Result<()> {
    let custom = output.join("404.html");
    if custom.is_file() {
        if is_head_request(&request) {
            return send_head(request, 404, HTML);
        }
        if let Ok(body) = fs::read(&custom) {
            return send_body(request, 404, HTML, body);
        }
    }
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// 503 while a rebuild holds the output root.
pub fn respond_rebuilding(request: Request) -> Result<()> {
    let response = Response::from_data(b"503 Rebuilding".to_vec())
        .with_status_code(StatusCode(503))
        .with_header(header("Content-Type", PLAIN)?)
        .with_header(header("Retry-After", RETRY_AFTER_SECS)?);
    request.respond(response)?;
    Ok(())
}

/// 503 when the last build failed and nothing older can be served.
pub fn respond_build_failed(request: Request) -> Result<()> {
    let body = b"503 Build Failed: see the terminal for the error report".to_vec();
    send_body(request, 503, PLAIN, body)
}

/// 503 while shutting down.
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

fn header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header `{key}: {value}`"))
}
