//! `corkboard replay`: drive the event loop from a recorded pointer trace.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

use corkboard::board::{FileSnapshotSource, HttpSnapshotSource, SnapshotSource};
use corkboard::config::BoardConfig;
use corkboard::drag::{DragController, FloatingControl, FloatingGesture, NullSurface};
use corkboard::geometry::Size;
use corkboard::runtime::{BoardInput, BoardRuntime};
use corkboard::sync::{LocalSync, PositionSync, PositionSyncClient};

pub async fn cmd_replay(
    project_dir: &Path,
    snapshot: Option<&Path>,
    trace: &Path,
    offline: bool,
    container: Option<Size>,
) -> Result<()> {
    let config = BoardConfig::load(project_dir)?;

    let trace_json = tokio::fs::read_to_string(trace)
        .await
        .with_context(|| format!("Failed to read trace at {}", trace.display()))?;
    let events: Vec<BoardInput> = serde_json::from_str(&trace_json)
        .with_context(|| format!("Failed to parse trace at {}", trace.display()))?;

    let source: Box<dyn SnapshotSource> = match snapshot {
        Some(path) => Box::new(FileSnapshotSource {
            path: path.to_path_buf(),
        }),
        None => Box::new(HttpSnapshotSource::new(&config.api)?),
    };
    let store = source.load().await?.into_store(&config.sizes);

    let sync: Arc<dyn PositionSync> = if offline {
        Arc::new(LocalSync::new())
    } else {
        Arc::new(PositionSyncClient::new(&config.api)?)
    };

    let container = container.unwrap_or_else(|| config.board.container());
    let controller = DragController::for_store(&store, container, config.board.margin, Arc::new(NullSurface));
    let floating = FloatingControl::from_config(&config.floating, container, Arc::new(NullSurface));
    let runtime = BoardRuntime::new(store, controller, sync).with_floating(floating);

    let (tx, rx) = mpsc::channel(events.len().max(1));
    for event in events {
        tx.send(event)
            .await
            .context("Event loop stopped before the trace was delivered")?;
    }
    drop(tx);

    let summary = runtime.run(rx).await;

    for report in &summary.reports {
        println!("notice: {}", report.notice());
    }
    for gesture in &summary.gestures {
        match gesture {
            FloatingGesture::Click => println!("floating: click"),
            FloatingGesture::Moved { from, to } => println!("floating: moved {} -> {}", from, to),
        }
    }
    if let Some(position) = summary.floating {
        println!("Floating control at {}", position);
    }
    println!();
    println!("Syncs issued: {}", summary.syncs_issued);
    println!();
    println!("{:<8} {:<14} {:<6} Title", "Id", "Position", "Z");
    for item in summary.store.list_ordered_by_z() {
        println!(
            "{:<8} {:<14} {:<6} {}",
            item.id.to_string(),
            item.position.to_string(),
            item.z_order,
            item.title
        );
    }
    Ok(())
}
