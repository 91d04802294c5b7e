//! Offline reshaping of generated dialogue files into training data.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// A dialogue as read back for formatting: only the turn texts matter, other
/// keys (persona, speaker, `image_text`, ...) may be absent or extra.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DialogueRecord {
    #[serde(default)]
    pub dialogue: Vec<RecordLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordLine {
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("cannot merge: types do not match ({first} vs {second})")]
    Mismatch {
        first: &'static str,
        second: &'static str,
    },
}

/// Turns alternate user/assistant by position; dialogues without turns are dropped.
pub fn to_chat(records: &[DialogueRecord]) -> Vec<Vec<ChatMessage>> {
    records
        .iter()
        .filter(|record| !record.dialogue.is_empty())
        .map(|record| {
            record
                .dialogue
                .iter()
                .enumerate()
                .map(|(index, line)| ChatMessage {
                    role: if index % 2 == 0 {
                        Role::User
                    } else {
                        Role::Assistant
                    },
                    content: line.text.clone(),
                })
                .collect()
        })
        .collect()
}

/// Lists concatenate; objects merge shallowly with `second` winning.
pub fn merge(first: Value, second: Value) -> Result<Value, MergeError> {
    match (first, second) {
        (Value::Array(mut first), Value::Array(second)) => {
            first.extend(second);
            Ok(Value::Array(first))
        }
        (Value::Object(mut first), Value::Object(second)) => {
            first.extend(second);
            Ok(Value::Object(first))
        }
        (first, second) => Err(MergeError::Mismatch {
            first: kind(&first),
            second: kind(&second),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

pub async fn format_file(input: &Path, output: &Path) -> Result<()> {
    let records: Vec<DialogueRecord> = read_input(input).await?;
    let conversations = to_chat(&records);
    log::info!(
        "Converted {} of {} dialogues to chat format",
        conversations.len(),
        records.len()
    );
    write_output(output, &conversations).await
}

pub async fn merge_files(first: &Path, second: &Path, output: &Path) -> Result<()> {
    let merged = merge(read_input(first).await?, read_input(second).await?)?;
    write_output(output, &merged).await
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

async fn read_input<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !is_stdio(path) {
        return output::read_json(path).await;
    }

    let mut data = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut data)
        .await
        .context("Failed to read standard input")?;
    serde_json::from_slice(&data).context("Failed to parse JSON from standard input")
}

async fn write_output<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if !is_stdio(path) {
        return output::write_json(path, value).await;
    }

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&output::to_pretty_json(value)?).await?;
    stdout.flush().await.context("Failed to flush standard output")
}
