pub mod default_config;
pub mod demo_world;
pub mod simulate;

use std::path::Path;

use sh_core::{World, WorldSnapshot};
use sh_simulation::EconomyConfig;

/// Read a file, naming it in the error.
fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}

/// Load and validate a world snapshot.
fn load_world(path: &Path) -> Result<World, String> {
    let json = read_file(path)?;
    let snapshot = WorldSnapshot::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))?;
    World::from_snapshot(snapshot).map_err(|e| format!("{}: {e}", path.display()))
}

/// Load an economy config. Fields missing from the file keep their defaults.
fn load_config(path: &Path) -> Result<EconomyConfig, String> {
    let json = read_file(path)?;
    let config: EconomyConfig =
        serde_json::from_str(&json).map_err(|e| format!("{}: {e}", path.display()))?;
    config
        .validate()
        .map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(config)
}

/// Write to `path`, or to stdout when no path is given.
fn write_output(content: &str, path: Option<&Path>) -> Result<(), String> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
            eprintln!("  Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}
