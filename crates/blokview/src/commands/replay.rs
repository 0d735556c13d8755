use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::config::Config;
use crate::decision::NavigationDecision;
use crate::script::{Callback, Report, Script};

/// Run the replay command.
pub fn run(path: &Path, json: bool, frames: bool) -> Result<()> {
    let script = Script::load(path)?;
    let config = Config::load_or_default()?;
    let report = script.run(config.settings(), frames);

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
        println!("{out}");
        return Ok(());
    }

    print_report(&report, frames);
    Ok(())
}

fn print_report(report: &Report, frames: bool) {
    if report.decisions.is_empty() {
        println!("{}", "No gesture completed.".yellow());
    }
    for entry in &report.decisions {
        let decision = match entry.decision {
            NavigationDecision::SnapBack => entry.decision.to_string().yellow(),
            NavigationDecision::Dismiss => entry.decision.to_string().red(),
            NavigationDecision::Advance(_) => entry.decision.to_string().green(),
        };
        println!("step {:>3}  {decision}", entry.step);
    }

    if !report.callbacks.is_empty() {
        println!();
        println!("{}", "Callbacks".bold());
        for callback in &report.callbacks {
            match callback {
                Callback::Dismiss => println!("  dismiss"),
                Callback::Advance { direction, target } => {
                    println!("  advance {direction} -> {target}")
                }
                Callback::Sheet { command } => println!("  sheet {command:?}"),
            }
        }
    }

    if frames {
        println!();
        println!("{}", "Frames".bold());
        for record in &report.frames {
            let f = &record.frame;
            println!(
                "  {:>5} ms  {:<13} tx={:>8.1} ty={:>8.1} scale={:.3} bg={:.2} img={:.2}",
                record.elapsed_ms,
                record.state.to_string(),
                f.transform.translate_x(),
                f.transform.translate_y(),
                f.transform.scale_x(),
                f.background_opacity,
                f.image_opacity,
            );
        }
    }

    println!();
    println!("{} {}", "Cursor:".bold(), report.cursor);
    println!("{} {}", "State:".bold(), report.state);
    if report.dismissed {
        println!("{}", "Viewer dismissed.".red().bold());
    }
    if !report.prefetched.is_empty() {
        let ids: Vec<String> = report.prefetched.iter().map(|id| id.to_string()).collect();
        println!("{} {}", "Prefetched:".bold(), ids.join(", "));
    }
}
