use serde::Deserialize;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set; add it to the environment or to .env")]
    MissingApiKey,
    #[error("failed to read environment: {0}")]
    Environment(#[from] envy::Error),
}

#[derive(Deserialize, Debug)]
struct Environment {
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    gemini_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl Config {
    /// Reads the process environment, supplemented by `.env` when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let environment = envy::from_iter::<_, Environment>(vars)?;

        let api_key = non_empty(environment.gemini_api_key).ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            api_key,
            model: non_empty(environment.gemini_model).unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            base_url: non_empty(environment.gemini_base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
