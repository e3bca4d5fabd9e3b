use std::path::{Path, PathBuf};

use crate::cli::config::RecorderConfig;
use crate::sequence::manager::Sequencer;
use crate::transport::host::{BufferedUi, DetachedHost, HostEvent};

// ============================================================================
// ingest subcommand
// ============================================================================

/// Replay captured event messages through a recording session and save the
/// result. Returns the written path.
pub fn cmd_ingest(
    config: &RecorderConfig,
    input: &str,
    title: &str,
    out: Option<&str>,
    verbose: u8,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(input)?;
    let mut sequencer = offline_sequencer(config);
    sequencer.new_file(title)?;

    let started = sequencer.set_recording(true);
    if !started.is_ok() {
        return Err(started.message.into());
    }

    let mut lines = 0;
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        lines += 1;
        sequencer.handle(HostEvent::Recorded(line.to_string()));
    }
    sequencer.set_recording(false);

    if verbose > 0 {
        eprintln!(
            "Read {} messages, recorded {} steps (producer version {})",
            lines,
            sequencer.sequence().len(),
            config.version
        );
    }

    let dir = out.unwrap_or(&config.save_dir);
    std::fs::create_dir_all(dir)?;
    let path = sequencer.save(title, Path::new(dir))?;
    println!("Recorded {} steps into {}", sequencer.sequence().len(), path.display());
    Ok(path)
}

// ============================================================================
// show subcommand
// ============================================================================

pub fn cmd_show(config: &RecorderConfig, file: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut sequencer = offline_sequencer(config);
    sequencer.load_from(Path::new(file))?;

    println!("{} ({} steps)", sequencer.title(), sequencer.sequence().len());
    for (id, text) in sequencer.lines() {
        println!("  {:>4}  {}", id, text);
    }
    Ok(())
}

// ============================================================================
// compact subcommand
// ============================================================================

pub fn cmd_compact(config: &RecorderConfig, file: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file);
    let mut sequencer = offline_sequencer(config);
    sequencer.load_from(path)?;

    let title = sequencer.title().to_string();
    sequencer.save_as(&title, path)?;
    println!("Compacted {} steps in {}", sequencer.sequence().len(), path.display());
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// A sequencer with no browser attached and a buffered UI.
fn offline_sequencer(config: &RecorderConfig) -> Sequencer {
    Sequencer::new(
        config.sequencer_config(),
        Box::new(BufferedUi::new()),
        Box::new(DetachedHost),
    )
}
