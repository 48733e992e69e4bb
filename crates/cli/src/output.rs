// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::Path;

use clap::ValueEnum;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use serde::Serialize;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format-branch helper for single-object commands.
///
/// Renders as JSON when `format` is `Json`, otherwise calls `text_fn`.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Text => {
            text_fn();
        }
    }
    Ok(())
}

/// Part of `log` not yet printed, given `printed` bytes already shown.
///
/// A shorter log (or an offset off a char boundary) means a different job;
/// the whole log is returned.
pub fn unseen(log: &str, printed: usize) -> &str {
    log.get(printed..).unwrap_or(log)
}

/// Print a chunk of job log without adding a trailing newline.
pub fn print_chunk(chunk: &str) {
    if chunk.is_empty() {
        return;
    }
    print!("{}", chunk);
    let _ = std::io::stdout().flush();
}

/// Print a complete job log, newline-terminated.
pub fn print_log(log: &str) {
    if log.is_empty() {
        return;
    }
    print!("{}", log);
    if !log.ends_with('\n') {
        println!();
    }
}

/// Display daemon log content with optional follow mode.
pub async fn display_log(
    log_path: &Path,
    content: &str,
    follow: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            print_log(content);
            if follow {
                tail_file(log_path).await?;
            }
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "log_path": log_path.to_string_lossy(),
                "lines": content.lines().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&obj)?);
            if follow {
                eprintln!("warning: --follow is not supported with --output json");
            }
        }
    }
    Ok(())
}

/// Tail a file, printing new lines as they appear, until Ctrl-C.
pub async fn tail_file(path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::File::open(path)
        .map_err(|_| anyhow::anyhow!("Log file not found: {}", path.display()))?;
    // Seek to end: the tail was already printed
    file.seek(SeekFrom::End(0))?;
    let mut reader = BufReader::new(file);

    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let mut watcher = notify::recommended_watcher(move |res: Result<NotifyEvent, _>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Modify(_)) {
                let _ = tx.blocking_send(());
            }
        }
    })?;
    let watch_dir = path.parent().unwrap_or(path);
    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            print!("{}", line);
            line.clear();
        }
        let _ = std::io::stdout().flush();

        tokio::select! {
            _ = rx.recv() => {}
            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}
