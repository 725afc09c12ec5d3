mod backup;
mod calc;
mod config;
mod db;
mod ipc;
mod store;

use serde_json::json;
use std::io::{self, BufRead, Write};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(filter: &str) {
    // stdout carries responses; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(filter)
                .unwrap_or_else(|_| config::DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() {
    let cfg = config::Config::from_env();
    init_logging(&cfg.log_filter);

    let mut state = ipc::AppState {
        workspace: None,
        store: None,
        page_size: cfg.page_size,
    };
    if let Some(path) = cfg.workspace.as_deref() {
        // Startup continues without a workspace; clients can still select one.
        if let Err(e) = ipc::select_workspace(&mut state, path) {
            error!(error = %e, "startup workspace unavailable");
        }
    }
    info!(version = env!("CARGO_PKG_VERSION"), "sungjukd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let resp = json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        debug!(id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("stdin closed, shutting down");
}
