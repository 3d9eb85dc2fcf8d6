// src/exec/process.rs

//! Spawning one Terraform process and capturing its output.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::backend::{CommandInvocation, ProcessOutput};

/// Run the invocation to completion and return its merged output.
///
/// stdout and stderr are read line by line on separate tasks and merged in
/// arrival order, so the blob reads like a terminal transcript. There is no
/// timeout; the call returns when the process exits.
pub async fn run_captured(invocation: &CommandInvocation) -> Result<ProcessOutput> {
    info!(
        program = ?invocation.program,
        args = ?invocation.args,
        cwd = ?invocation.cwd,
        "starting terraform process"
    );

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .current_dir(&invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning {:?}", invocation.program))?;

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, line_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, line_tx.clone()));
    }
    // Receiving ends once both readers hit EOF and drop their senders.
    drop(line_tx);

    let mut output = String::new();
    while let Some(line) = line_rx.recv().await {
        output.push_str(&line);
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for {:?}", invocation.program))?;

    info!(
        subcommand = invocation.subcommand(),
        exit_code = ?status.code(),
        success = status.success(),
        "terraform process exited"
    );

    Ok(ProcessOutput {
        exit_code: status.code(),
        output,
    })
}

async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "stopped reading process output");
                break;
            }
        }
    }
}
