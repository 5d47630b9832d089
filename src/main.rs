use rosterd::config::RosterConfig;
use rosterd::{ipc, logging};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    logging::init();

    let config = match RosterConfig::from_env() {
        Ok(c) => c,
        Err(e) => return fatal("config_error", &e.to_string()),
    };

    let mut state = ipc::AppState::new(config);
    let db_path = state.config.database_path();
    if let Err(e) = state.open_store(db_path) {
        return fatal("db_open_failed", &e.to_string());
    }
    info!(version = env!("CARGO_PKG_VERSION"), "rosterd ready");

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
                let resp = ipc::err("", "bad_json", e.to_string(), None);
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    info!("stdin closed, shutting down");
    ExitCode::SUCCESS
}

/// Startup failures are reported once on stdout so the GUI can show them,
/// then the process exits.
fn fatal(code: &str, message: &str) -> ExitCode {
    error!(code, message, "startup failed");
    let mut stdout = io::stdout();
    let _ = writeln!(stdout, "{}", ipc::err("", code, message, None));
    let _ = stdout.flush();
    ExitCode::FAILURE
}
