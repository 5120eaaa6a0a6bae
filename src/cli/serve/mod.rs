//! Development server with live reload support.
//!
//! Serves the output root over `tiny_http`, injecting the live-reload
//! client into HTML responses. The actor system (watcher, task runner,
//! WebSocket broadcast) runs on its own tokio runtime.

mod lifecycle;
mod path;
mod response;

use crate::{
    config::{PackConfig, cfg},
    debug, log,
    task::{TaskContext, TaskId},
};
use anyhow::{Context, Result};
use crossbeam::channel;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tiny_http::{Request, Server};

/// Number of threads answering HTTP requests.
const REQUEST_THREADS: usize = 4;

/// Actual WebSocket port (may differ from the configured one if it was in use)
/// Updated by the coordinator after the WebSocket server binds
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(0);

/// Update the actual WebSocket port (called by coordinator after binding)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

/// Live-reload port, `None` until the WebSocket server is up.
fn actual_ws_port() -> Option<u16> {
    match ACTUAL_WS_PORT.load(Ordering::Relaxed) {
        0 => None,
        port => Some(port),
    }
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server without starting the request loop
pub fn bind_server() -> Result<BoundServer> {
    let config = cfg();
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    Ok(BoundServer {
        server,
        addr,
        shutdown_rx,
    })
}

impl BoundServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the actors, then run the request loop until Ctrl+C.
    pub fn run(self, ctx: TaskContext, failed: Vec<(TaskId, String)>) -> Result<()> {
        let ws_port = ctx.config.serve.ws_port;
        debug!("reload"; "ws://{}:{} (first port tried)", ctx.config.serve.interface, ws_port);

        let actor_handle = lifecycle::spawn_actors(ctx, ws_port, failed, self.shutdown_rx);
        run_request_loop(&self.server)?;
        lifecycle::wait_for_shutdown(actor_handle);
        Ok(())
    }
}

fn run_request_loop(server: &Server) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let config = cfg();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &config) {
                debug!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, config: &PackConfig) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let ws_port = actual_ws_port();

    // The live-reload client is served from memory
    if let Some(port) = ws_port {
        use crate::embed::serve::{HOTRELOAD_JS, HotreloadVars};
        if request.url() == HOTRELOAD_JS.url_path(&HotreloadVars { ws_port: port }) {
            return response::respond_hotreload_js(request, port);
        }
    }

    let root = config.output_dir();
    match path::resolve_path(request.url(), root) {
        Some(file) => response::respond_file(request, &file, ws_port),
        None => response::respond_not_found(request, root, ws_port),
    }
}
