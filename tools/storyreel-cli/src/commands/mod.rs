pub mod check;
pub mod export;
pub mod plan;

use std::io::Read;
use std::path::Path;

use anyhow::Context;

/// Read narration from a file, or from stdin when `path` is `-`.
pub fn read_narration(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read narration from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read narration from {}", path.display()))
}
