//! Logs command - inspect or clear the snapshot log

use std::path::Path;

use anyhow::Context;
use colored::*;
use joyservo_library::{LogRecord, LogStore};

fn summary(record: &LogRecord) -> String {
    let servos: Vec<String> = record
        .servos
        .channels
        .iter()
        .map(|s| {
            format!(
                "S{}:{}{:3}°{}",
                s.channel,
                s.direction.arrow(),
                s.angle,
                if s.hold { "L" } else { "" }
            )
        })
        .collect();
    let lock = if record.servos.lock { " LOCK" } else { "" };
    format!(
        "{} Spd:{:.1}x{} | Accel {:5.1} {:5.1} {:5.1}",
        servos.join(" "),
        record.servos.speed,
        lock,
        record.sensor.reading.accel.x,
        record.sensor.reading.accel.y,
        record.sensor.reading.accel.z
    )
}

pub fn execute(store_path: &Path, limit: usize, clear: bool, json: bool) -> anyhow::Result<()> {
    let store = LogStore::open(store_path)
        .with_context(|| format!("Failed to open {}", store_path.display()))?;

    if clear {
        store.clear()?;
        println!("{} Cleared {}", "✓".green(), store_path.display());
        return Ok(());
    }

    let records = store.recent(limit)?;
    if records.is_empty() {
        println!("{}", "No snapshots recorded yet".yellow());
        return Ok(());
    }

    for record in &records {
        if json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            println!(
                "{} {} {}",
                format!("#{:<5}", record.id).dimmed(),
                record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().cyan(),
                summary(record)
            );
        }
    }
    Ok(())
}
