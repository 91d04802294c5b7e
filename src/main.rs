mod config;
mod dataset;
mod dialogue;
mod gemini;
mod generate;
mod output;
mod prompt;

use anyhow::Context;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

const PERSONAS_FILE: &str = "prompts/personas_scenarios.txt";
const OUTPUT_FILE: &str = "outputs/dialogues.json";

#[derive(StructOpt, Debug)]
#[structopt(
    name = "synthetic-dialogues",
    about = "Generate multi-persona conversations with Gemini"
)]
struct Args {
    #[structopt(subcommand)]
    command: Option<Command>,
}

#[derive(StructOpt, Debug)]
enum Command {
    /// Convert a dialogues file into user/assistant chat lists
    Format {
        /// Input JSON file, or `-` for stdin
        input: PathBuf,
        /// Output JSON file, or `-` for stdout
        output: PathBuf,
    },
    /// Concatenate two JSON lists (or shallow-merge two objects)
    Merge {
        /// First input JSON file, or `-` for stdin
        first: PathBuf,
        /// Second input JSON file, or `-` for stdin
        second: PathBuf,
        /// Output JSON file, or `-` for stdout
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::from_args();

    match args.command {
        None => {
            let config = config::Config::from_env().context("Failed to load configuration")?;
            log::info!("Using model {}", config.model);

            let client = gemini::GeminiClient::new(&config);
            generate::run(&client, Path::new(PERSONAS_FILE), Path::new(OUTPUT_FILE)).await?;
        }
        Some(Command::Format { input, output }) => dataset::format_file(&input, &output).await?,
        Some(Command::Merge {
            first,
            second,
            output,
        }) => dataset::merge_files(&first, &second, &output).await?,
    }

    Ok(())
}
