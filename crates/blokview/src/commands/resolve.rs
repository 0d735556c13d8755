use anyhow::Result;
use colored::Colorize;

use crate::cursor::ViewerCursor;
use crate::item::{ItemId, ItemSummary};

pub fn run(items: &[String], current: &str, json: bool) -> Result<()> {
    let list: Vec<ItemSummary> = items
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(ItemSummary::new)
        .collect();
    let cursor = ViewerCursor::resolve(&list, &ItemId::from(current));

    if json {
        println!("{}", serde_json::to_string_pretty(&cursor)?);
        return Ok(());
    }

    if cursor.previous.is_none() && cursor.next.is_none() && list.len() > 1 {
        tracing::warn!("{current} has no neighbours in the given list");
    }
    let show = |id: &Option<ItemId>| match id {
        Some(id) => id.to_string().green().to_string(),
        None => "-".dimmed().to_string(),
    };
    println!("{}  {}", "previous".bold(), show(&cursor.previous));
    println!("{}   {}", "current".bold(), cursor.current);
    println!("{}      {}", "next".bold(), show(&cursor.next));
    Ok(())
}
