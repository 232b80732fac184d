use std::path::Path;

use sh_simulation::EconomyConfig;

pub fn run(output: Option<&Path>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&EconomyConfig::default())
        .map_err(|e| format!("JSON serialization error: {e}"))?;
    super::write_output(&json, output)
}
