use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::dialogue::Dialogue;

/// Pretty-prints `value` as UTF-8 JSON without escaping non-ASCII text.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buffer = serde_json::to_vec_pretty(value).context("Failed to serialize JSON")?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Writes the complete list in one go, replacing whatever was at `path`.
pub async fn write_dialogues(path: &Path, dialogues: &[Dialogue]) -> Result<()> {
    write_json(path, dialogues).await
}

#[cfg(test)]
pub async fn read_dialogues(path: &Path) -> Result<Vec<Dialogue>> {
    read_json(path).await
}

pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    tokio::fs::write(path, to_pretty_json(value)?)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_slice(&data).with_context(|| format!("Failed to parse JSON in {}", path.display()))
}
