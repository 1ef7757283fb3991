//! `corkboard move`: one-shot position sync.

use anyhow::{Result, bail};
use std::path::Path;

use corkboard::board::ItemId;
use corkboard::config::BoardConfig;
use corkboard::sync::{PositionSync, PositionSyncClient, PositionUpdate, SyncOutcome};

pub async fn cmd_move(project_dir: &Path, id: i64, x: f64, y: f64) -> Result<()> {
    let config = BoardConfig::load(project_dir)?;
    let client = PositionSyncClient::new(&config.api)?;
    let item_id = ItemId(id);
    let sent = PositionUpdate::from_coords(x, y);

    match client.update_position(item_id, x, y).await {
        SyncOutcome::Synced => {
            println!("Memo {} saved at ({}, {})", item_id, sent.x, sent.y);
            Ok(())
        }
        SyncOutcome::Failed(err) => {
            if !client.session_valid() {
                eprintln!("Session is no longer valid; sign in again.");
            }
            bail!("Could not save memo {}: {}", item_id, err)
        }
    }
}
