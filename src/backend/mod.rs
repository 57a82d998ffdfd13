// Backend child process. Each stdout line is one JSON event for the bridge.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::BackendConfig;
use crate::error::ShellError;
use crate::shell::bridge::BackendEvent;

/// Start the configured backend and forward its events until it exits.
/// Must run inside the async runtime.
pub async fn run(
    config: BackendConfig,
    events: mpsc::Sender<BackendEvent>,
) -> Result<(), ShellError> {
    let program = config
        .command
        .ok_or_else(|| ShellError::Backend("no backend command configured".into()))?;

    let mut command = Command::new(&program);
    command
        .args(&config.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    if let Some(cwd) = &config.cwd {
        command.current_dir(cwd);
    }

    let mut child = command
        .spawn()
        .map_err(|e| ShellError::Backend(format!("failed to start {program}: {e}")))?;
    info!(program = %program, pid = child.id(), "backend started");

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ShellError::Backend("backend stdout not captured".into()))?;
    let forwarded = forward_lines(stdout, &events).await;

    let status = child
        .wait()
        .await
        .map_err(|e| ShellError::Backend(format!("failed to wait for backend: {e}")))?;
    info!(%status, forwarded, "backend exited");
    Ok(())
}

/// Read newline-delimited JSON and push each event. Returns how many were sent.
///
/// Lines are handled as raw bytes; a line that is not valid UTF-8 or not JSON
/// is skipped. Only end of stream, a read error or a closed bridge stop it.
pub async fn forward_lines<R>(reader: R, events: &mpsc::Sender<BackendEvent>) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut sent = 0;
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("backend stream read error: {e}");
                break;
            }
        }
        let Some(event) = parse_line(&line) else {
            continue;
        };
        // Waits while the bridge is still delivering the previous event.
        if events.send(event).await.is_err() {
            debug!("event bridge gone, stop reading backend");
            break;
        }
        sent += 1;
    }
    sent
}

fn parse_line(line: &[u8]) -> Option<BackendEvent> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_slice(line) {
        Ok(value) => Some(BackendEvent(value)),
        Err(e) => {
            warn!("skipping malformed backend output: {e}");
            None
        }
    }
}
