//! `boxcutter watch`: keep a preview in sync with an HTML file on disk.
//!
//! The watcher is started before the first read so a save racing with
//! startup is not lost. Ctrl+C shuts the preview down cleanly.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use boxcutter::{HostChannel, NoScripts, Preview, PreviewConfig, PreviewEvent, Source};
use notify::event::ModifyKind;
use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

pub async fn run(config: PreviewConfig, file: &Path, id: Option<String>) -> Result<()> {
    let file = std::path::absolute(file)
        .with_context(|| format!("invalid path `{}`", file.display()))?;
    let dir = file
        .parent()
        .map(Path::to_path_buf)
        .context("watched file has no parent directory")?;
    let id = id.unwrap_or_else(|| file.display().to_string());

    // notify is callback-based; bridge it to tokio through a thread
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })?;
    // Editors often replace the file instead of writing it, so watch the
    // directory and filter by name.
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    let (change_tx, mut change_rx) = mpsc::channel::<()>(64);
    let target = file.clone();
    std::thread::spawn(move || {
        while let Ok(result) = notify_rx.recv() {
            match result {
                Ok(event) => {
                    if touches(&event, &target) && change_tx.blocking_send(()).is_err() {
                        break;
                    }
                }
                Err(e) => boxcutter::log!("watch"; "notify error: {}", e),
            }
        }
    });

    let html = read_source(&file)?;
    let channel = HostChannel::new();
    let printer = super::print_traffic(&channel);
    let preview = Preview::mount(&channel, config, Source::new(id.clone(), html), Arc::new(NoScripts)).await?;
    let mut events = preview.events();

    boxcutter::log!("watch"; "watching {}", file.display());

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            Some(()) = change_rx.recv() => match read_source(&file) {
                Ok(html) => {
                    boxcutter::debug!("watch"; "changed {}", file.display());
                    preview.set_source(Source::new(id.clone(), html));
                }
                // Transient while an editor swaps the file in
                Err(e) => boxcutter::debug!("watch"; "{:#}", e),
            },
            event = events.recv() => match event {
                Ok(PreviewEvent::Error(message)) => boxcutter::log!("watch"; "{}", message),
                Ok(PreviewEvent::LoadingChanged(false)) => boxcutter::log!("watch"; "synced {}", id),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    drop(watcher);
    preview.shutdown().await;
    printer.abort();
    boxcutter::log!("watch"; "stopped");
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read `{}`", path.display()))
}

/// Whether `event` is a content change of `target`.
fn touches(event: &notify::Event, target: &Path) -> bool {
    let relevant = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    relevant && event.paths.iter().any(|p| p.file_name() == target.file_name())
}
