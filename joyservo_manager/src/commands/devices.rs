//! Devices command - list input devices and how they would be used

use colored::*;
use joyservo_library::InputDriver;

pub fn execute() -> anyhow::Result<()> {
    let devices = InputDriver::enumerate();

    if devices.is_empty() {
        println!("{}", "No input devices found".yellow());
        if cfg!(not(feature = "evdev-input")) {
            println!(
                "   {} built without {}; only scripted input is available",
                "[NOTE]".cyan(),
                "evdev-input".bright_blue()
            );
        }
        return Ok(());
    }

    println!("{}", "Input devices:".cyan().bold());
    for device in &devices {
        let layout = match device.kind() {
            Some(kind) => format!("[{}]", kind).green(),
            None => "[generic, explicit --device only]".dimmed(),
        };
        println!("   • {} {} {}", device.path.bright_blue(), device.name, layout);
    }
    Ok(())
}
