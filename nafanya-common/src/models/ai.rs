// File: nafanya-common/src/models/ai.rs

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The closed set of generative backends the bot can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "oai")]
    OpenAi,
    Google,
    DeepSeek,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::OpenAi, ProviderKind::Google, ProviderKind::DeepSeek];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "oai",
            ProviderKind::Google => "google",
            ProviderKind::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "oai" | "openai" => Ok(ProviderKind::OpenAi),
            "google" | "gemini" => Ok(ProviderKind::Google),
            "deepseek" | "ds" => Ok(ProviderKind::DeepSeek),
            other => Err(Error::UnknownModel(other.to_string())),
        }
    }
}
