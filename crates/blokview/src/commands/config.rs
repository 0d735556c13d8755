use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
        ConfigCommands::Path => {
            println!("{}", Config::path()?.display());
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = if path.exists() {
        println!("{} {}", "Config file:".bold(), path.display());
        Config::load_from(&path)?
    } else {
        println!(
            "{}",
            format!("No config file at {}; showing defaults.", path.display()).yellow()
        );
        Config::default()
    };

    let file = serde_yaml::to_string(&config)?;
    if config != Config::default() {
        println!();
        print!("{file}");
    }

    let settings = config.settings();
    let t = settings.thresholds;
    let timings = settings.timings;
    println!();
    println!("{}", "Effective settings".bold());
    println!("  dismiss_fraction            {}", t.dismiss_fraction);
    println!("  advance_fraction            {}", t.advance_fraction);
    println!("  velocity_threshold          {}", t.velocity_threshold);
    println!("  dismiss_velocity_threshold  {}", t.dismiss_velocity_threshold);
    println!("  fail_offset                 {}", settings.fail_offset);
    println!("  min_distance                {}", settings.min_distance);
    println!("  backdrop_opacity            {}", settings.feedback.backdrop_opacity);
    println!(
        "  scale range                 {} .. {}",
        settings.feedback.min_scale, settings.feedback.max_scale
    );
    println!("  pinch_settle_ms             {}", timings.pinch_settle.as_millis());
    println!("  transition_ms               {}", timings.transition.as_millis());
    println!("  dismiss_ms                  {}", timings.dismiss.as_millis());
    println!("  snap_back_ms                {}", timings.snap_back.as_millis());
    println!("  prefetch                    {}", settings.prefetch);
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = match Config::path() {
        Ok(path) if path.exists() => Config::load_from(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        _ => Config::default(),
    };
    config.set(key, value)?;
    let path = config.save()?;
    println!(
        "{}",
        format!("Set {key} = {value} in {}", path.display()).green()
    );
    Ok(())
}
