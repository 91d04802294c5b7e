use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: String,
    #[serde(rename = "text")]
    pub utterance: String,
}

impl Turn {
    pub fn new(speaker: impl Into<String>, utterance: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            utterance: utterance.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogue {
    pub persona: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(rename = "dialogue", default)]
    pub turns: Vec<Turn>,
}

/// The object shape the prompt asks the model to return.
#[derive(Deserialize)]
struct StructuredCompletion {
    persona: Option<String>,
    scenario: Option<String>,
    #[serde(default)]
    dialogue: Vec<Turn>,
}

/// Best-effort conversion of a free-text completion into a dialogue.
///
/// A JSON object in the requested shape is preferred; plain text falls back
/// to reading `Speaker: utterance` lines. JSON that cannot be decoded (cut
/// off, say) yields no turns. `persona` is used when the completion does not
/// name one.
pub fn parse(completion: &str, persona: &str) -> Dialogue {
    let cleaned = strip_code_fences(completion);

    let turns = match parse_structured(&cleaned) {
        Structured::Parsed(structured) => {
            return Dialogue {
                persona: structured
                    .persona
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| persona.to_owned()),
                scenario: structured.scenario,
                turns: structured.dialogue,
            };
        }
        Structured::Malformed => Vec::new(),
        Structured::NotJson => parse_lines(&cleaned),
    };

    Dialogue {
        persona: persona.to_owned(),
        scenario: None,
        turns,
    }
}

enum Structured {
    Parsed(StructuredCompletion),
    Malformed,
    NotJson,
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_owned()
}

fn looks_like_json(text: &str) -> bool {
    text.starts_with('{') || text.contains("\"dialogue\"") || text.contains("\"speaker\"")
}

/// Tries the text as is, the outermost `{…}` span, then the text with missing
/// outer braces added. A candidate carrying turns wins over one without.
fn parse_structured(text: &str) -> Structured {
    if !looks_like_json(text) {
        return Structured::NotJson;
    }

    let mut candidates = vec![text.to_owned()];
    if let (Some(open), Some(close)) = (text.find('{'), text.rfind('}')) {
        if open < close {
            candidates.push(text[open..=close].to_owned());
        }
    }
    let mut repaired = String::with_capacity(text.len() + 2);
    if !text.starts_with('{') {
        repaired.push('{');
    }
    repaired.push_str(text);
    if !text.ends_with('}') {
        repaired.push('}');
    }
    candidates.push(repaired);

    let mut fallback = None;
    for candidate in &candidates {
        match serde_json::from_str::<StructuredCompletion>(candidate) {
            Ok(structured) if !structured.dialogue.is_empty() => {
                return Structured::Parsed(structured);
            }
            Ok(structured) => {
                fallback.get_or_insert(structured);
            }
            Err(err) => log::debug!("Completion candidate is not a dialogue object: {err}"),
        }
    }

    match fallback {
        Some(structured) => Structured::Parsed(structured),
        None => Structured::Malformed,
    }
}

fn parse_lines(text: &str) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::new();

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match split_speaker(line) {
            Some((speaker, utterance)) => turns.push(Turn::new(speaker, utterance)),
            None => match turns.last_mut() {
                Some(previous) if previous.utterance.is_empty() => {
                    previous.utterance = line.to_owned();
                }
                Some(previous) => {
                    previous.utterance.push(' ');
                    previous.utterance.push_str(line);
                }
                None => log::debug!("Dropping unattributed line: `{line}`"),
            },
        }
    }

    turns
}

fn split_speaker(line: &str) -> Option<(&str, &str)> {
    let (speaker, utterance) = line.split_once(':')?;
    let speaker = speaker.trim().trim_matches('*').trim();
    if speaker.is_empty() {
        return None;
    }
    Some((speaker, utterance.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_labelled_lines_become_two_turns() {
        let dialogue = parse("A: hello\nB: hi", "Ravi");
        assert_eq!(dialogue.persona, "Ravi");
        assert_eq!(dialogue.scenario, None);
        assert_eq!(dialogue.turns, vec![Turn::new("A", "hello"), Turn::new("B", "hi")]);
    }

    #[test]
    fn unlabelled_lines_continue_the_previous_turn() {
        let dialogue = parse("stray preamble\nA: hello\nthere friend\n\nB: hi", "Ravi");
        assert_eq!(
            dialogue.turns,
            vec![Turn::new("A", "hello there friend"), Turn::new("B", "hi")]
        );
    }

    #[test]
    fn only_the_first_colon_separates_the_speaker() {
        let dialogue = parse("**Meera**: meet me at 5:30, okay?", "Meera");
        assert_eq!(dialogue.turns, vec![Turn::new("Meera", "meet me at 5:30, okay?")]);
    }

    #[test]
    fn fenced_json_object_is_preferred() {
        let completion = r#"```json
{
  "persona": "Ravi",
  "scenario": "Haggling over a fare",
  "dialogue": [
    {"speaker": "Ravi", "text": "Bhaiya, meter se chalenge?"},
    {"speaker": "Interlocutor", "text": "Haan, bilkul."}
  ]
}
```"#;
        let dialogue = parse(completion, "fallback");

        assert_eq!(dialogue.persona, "Ravi");
        assert_eq!(dialogue.scenario.as_deref(), Some("Haggling over a fare"));
        assert_eq!(
            dialogue.turns,
            vec![
                Turn::new("Ravi", "Bhaiya, meter se chalenge?"),
                Turn::new("Interlocutor", "Haan, bilkul."),
            ]
        );
    }

    #[test]
    fn missing_braces_are_repaired() {
        let completion = r#""persona": "Meera", "dialogue": [{"speaker": "Meera", "text": "Chalo!"}]"#;
        let dialogue = parse(completion, "fallback");
        assert_eq!(dialogue.persona, "Meera");
        assert_eq!(dialogue.turns, vec![Turn::new("Meera", "Chalo!")]);
    }

    #[test]
    fn preamble_before_the_object_is_skipped() {
        let completion = "Sure! Here is the JSON:\n{\"persona\": \"Ravi\", \"dialogue\": [{\"speaker\": \"Ravi\", \"text\": \"Chalo\"}]}";
        let dialogue = parse(completion, "fallback");
        assert_eq!(dialogue.persona, "Ravi");
        assert_eq!(dialogue.turns, vec![Turn::new("Ravi", "Chalo")]);
    }

    #[test]
    fn truncated_object_yields_no_turns() {
        let completion = r#"{
  "persona": "Ravi",
  "scenario": "Haggling over a fare",
  "dialogue": [
    {"speaker": "Ravi", "text": "Bhaiya, meter se chalenge?"},
    {"speaker": "Interlocutor", "text": "Haan, bil"#;
        let dialogue = parse(completion, "Ravi");
        assert_eq!(dialogue.persona, "Ravi");
        assert!(dialogue.turns.is_empty());
    }

    #[test]
    fn object_without_persona_uses_the_prompt_persona() {
        let dialogue = parse(r#"{"dialogue": [{"speaker": "A", "text": "yo"}]}"#, "Ravi");
        assert_eq!(dialogue.persona, "Ravi");
        assert_eq!(dialogue.turns.len(), 1);
    }

    #[test]
    fn empty_completion_yields_no_turns() {
        let dialogue = parse("", "Ravi");
        assert_eq!(dialogue.persona, "Ravi");
        assert!(dialogue.turns.is_empty());
    }

    #[test]
    fn serializes_in_the_output_shape() {
        let dialogue = Dialogue {
            persona: "Ravi".to_string(),
            scenario: None,
            turns: vec![Turn::new("A", "hello")],
        };
        assert_eq!(
            serde_json::to_value(&dialogue).unwrap(),
            serde_json::json!({"persona": "Ravi", "dialogue": [{"speaker": "A", "text": "hello"}]})
        );
    }
}
