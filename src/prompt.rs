use anyhow::{Context, Result};
use itertools::Itertools;
use std::path::Path;

/// One persona/scenario line and the request text built for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub index: usize,
    pub persona: String,
    pub text: String,
}

pub async fn load_personas(path: &Path) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read persona file {}", path.display()))?;

    let personas = parse_personas(&contents);
    anyhow::ensure!(
        !personas.is_empty(),
        "Persona file {} contains no personas",
        path.display()
    );

    Ok(personas)
}

pub fn parse_personas(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn system_prompt(personas: &[String]) -> String {
    format!(
        "SYSTEM:\n\
IMPORTANT: Return ONLY a single valid JSON object (start '{{' and end '}}') per request. \
NO markdown, NO extra text.\n\
You are an expert conversational AI generator. Generate each conversation in natural Hinglish, \
code-switching between Hindi and English. Keep utterances idiomatic and under 40 words per turn.\n\n\
Personas & Scenarios (one per request):\n{}",
        personas.iter().join("\n")
    )
}

pub fn user_prompt(index: usize, persona: &str) -> String {
    format!(
        r#"USER:
Generate a single JSON object for Persona #{index}:
{persona}
Format:
{{
  "persona": "<Name>",
  "scenario": "<Short scenario>",
  "dialogue": [
    {{"speaker":"<Name>", "text":"…"}},
    {{"speaker":"Interlocutor","text":"…"}},
    …6 turns total…
  ]
}}"#
    )
}

/// Builds one request per persona, numbered from 1 in file order.
pub fn build(personas: &[String]) -> Vec<PromptSpec> {
    let system = system_prompt(personas);

    personas
        .iter()
        .enumerate()
        .map(|(index, persona)| {
            let index = index + 1;
            PromptSpec {
                index,
                persona: persona.clone(),
                text: format!("{system}\n\n{}", user_prompt(index, persona)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_lines_are_trimmed_and_blanks_dropped() {
        let personas = parse_personas("  Ravi, a cab driver in Delhi \n\n\t\nMeera, a college student\n");
        assert_eq!(personas, vec!["Ravi, a cab driver in Delhi", "Meera, a college student"]);
    }

    #[test]
    fn system_prompt_lists_every_persona() {
        let personas = vec!["Ravi".to_string(), "Meera".to_string()];
        let prompt = system_prompt(&personas);
        assert!(prompt.starts_with("SYSTEM:\n"));
        assert!(prompt.contains("single valid JSON object (start '{' and end '}')"));
        assert!(prompt.ends_with("one per request):\nRavi\nMeera"));
    }

    #[test]
    fn prompts_are_numbered_in_file_order() {
        let personas = vec!["Ravi".to_string(), "Meera".to_string()];
        let prompts = build(&personas);

        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].index, 1);
        assert_eq!(prompts[1].persona, "Meera");
        assert!(prompts[1].text.contains("Persona #2:\nMeera\n"));
        assert!(prompts[1].text.contains("\"dialogue\": ["));
        assert!(prompts[0].text.contains("\n\nUSER:\n"));
    }

    #[tokio::test]
    async fn empty_persona_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("personas.txt");
        tokio::fs::write(&path, "\n  \n").await.expect("write");

        let err = load_personas(&path).await.unwrap_err();
        assert!(err.to_string().contains("contains no personas"));
    }

    #[tokio::test]
    async fn missing_persona_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_personas(&dir.path().join("absent.txt")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read persona file"));
    }
}
