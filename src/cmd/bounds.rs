//! `corkboard bounds`: inspect the legal rectangle for an item.

use anyhow::{Result, bail};

use corkboard::geometry::{BOARD_MARGIN, Position, Size, clamp, compute_bounds};

pub fn cmd_bounds(
    item: Size,
    container: Size,
    margin: Option<i32>,
    clamp_at: Option<&[i32]>,
) -> Result<()> {
    let margin = margin.unwrap_or(BOARD_MARGIN);
    if margin < 0 {
        bail!("Margin must not be negative (got {})", margin);
    }

    let bounds = compute_bounds(item, container, margin);
    println!("item      = {}", item);
    println!("container = {}", container);
    println!("margin    = {}", margin);
    println!("min_x = {}", bounds.min_x);
    println!("max_x = {}", bounds.max_x);
    println!("min_y = {}", bounds.min_y);
    println!("max_y = {}", bounds.max_y);
    if bounds.is_degenerate() {
        println!("note: container is smaller than item plus margins; positions collapse to the minimum");
    }

    if let Some(&[x, y]) = clamp_at {
        let proposed = Position::new(x, y);
        println!("clamped {} -> {}", proposed, clamp(proposed, &bounds));
    }
    Ok(())
}
