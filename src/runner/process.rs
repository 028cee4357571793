use std::io::{self, BufRead, BufReader, PipeReader, Read};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::process::{Child, Command};

use super::SlotGuard;
use crate::command::Invocation;
use crate::events::{EventSender, RunEvent};

/// A launched engine and the read end of its combined stdout/stderr.
pub(crate) struct Spawned {
    pub child: Child,
    pub output: PipeReader,
}

/// Launch the engine with stdout and stderr sharing one pipe, so lines keep
/// the order the engine wrote them in.
pub(crate) fn spawn(invocation: &Invocation) -> io::Result<Spawned> {
    let (reader, writer) = io::pipe()?;

    let mut cmd = Command::new(invocation.program());
    cmd.args(invocation.args())
        .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer);
    if let Some(dir) = &invocation.working_dir {
        cmd.current_dir(dir);
    }

    let child = cmd.spawn()?;
    // `cmd` still holds the write ends; they close when it drops here, so the
    // reader sees EOF once the engine exits.
    Ok(Spawned {
        child,
        output: reader,
    })
}

/// Worker body: forward every output line, reap the child, report its code.
///
/// The busy slot is released and `running` cleared before `Completed` goes
/// out, so a caller reacting to completion can start the next run at once.
pub(crate) async fn drive(
    spawned: Spawned,
    events: EventSender,
    running: Arc<AtomicBool>,
    slot: SlotGuard,
) -> i32 {
    let Spawned { mut child, output } = spawned;

    let line_events = events.clone();
    let pump = tokio::task::spawn_blocking(move || pump_lines(output, &line_events));
    if let Err(e) = pump.await {
        tracing::warn!(error = %e, "engine output reader stopped");
    }

    let code = match child.wait().await {
        Ok(status) => status.code().unwrap_or(-1),
        Err(e) => {
            tracing::warn!(error = %e, "failed to wait for engine");
            -1
        }
    };
    tracing::info!(code, "engine exited");

    running.store(false, Ordering::SeqCst);
    drop(slot);
    events.emit(RunEvent::Completed(code));
    code
}

/// Read `output` to EOF, emitting one event per line.
///
/// `\n`, `\r\n` and a lone `\r` all end a line, so progress bars that redraw
/// with `\r` surface each update as it is written.
fn pump_lines(output: impl Read, events: &EventSender) {
    let mut reader = BufReader::new(output);
    let mut line = Vec::new();
    let mut after_cr = false;
    loop {
        let chunk = match reader.fill_buf() {
            Ok([]) => break,
            Ok(chunk) => chunk,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read engine output");
                break;
            }
        };
        let len = chunk.len();
        for &byte in chunk {
            match byte {
                b'\n' if after_cr => after_cr = false,
                b'\n' | b'\r' => {
                    events.line(decode_line(&line));
                    line.clear();
                    after_cr = byte == b'\r';
                }
                _ => {
                    after_cr = false;
                    line.push(byte);
                }
            }
        }
        reader.consume(len);
    }
    if !line.is_empty() {
        events.line(decode_line(&line));
    }
}

/// Strip the line terminator and decode, replacing invalid UTF-8.
pub fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
