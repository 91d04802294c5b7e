use anyhow::{Context, Result};
use std::path::Path;

use crate::dialogue::{self, Dialogue};
use crate::gemini::CompletionModel;
use crate::output;
use crate::prompt::{self, PromptSpec};

/// Runs every prompt in order, one at a time, stopping at the first model failure.
pub async fn generate<M: CompletionModel>(model: &M, prompts: &[PromptSpec]) -> Result<Vec<Dialogue>> {
    let mut dialogues = Vec::with_capacity(prompts.len());

    for prompt in prompts {
        log::info!("Requesting persona #{}/{}", prompt.index, prompts.len());

        let completion = model
            .complete(&prompt.text)
            .await
            .with_context(|| format!("Model call failed for persona #{}", prompt.index))?;
        log::debug!("Completion for persona #{}: {completion}", prompt.index);

        let dialogue = dialogue::parse(&completion, &prompt.persona);
        if dialogue.turns.is_empty() {
            log::warn!("No turns could be read from the completion for persona #{}", prompt.index);
        }

        dialogues.push(dialogue);
    }

    Ok(dialogues)
}

/// One full pass: personas in, dialogue file out.
pub async fn run<M: CompletionModel>(model: &M, personas_path: &Path, output_path: &Path) -> Result<()> {
    let personas = prompt::load_personas(personas_path).await?;
    let prompts = prompt::build(&personas);

    let dialogues = generate(model, &prompts).await?;

    output::write_dialogues(output_path, &dialogues).await?;
    log::info!("Wrote {} dialogues to {}", dialogues.len(), output_path.display());

    Ok(())
}
