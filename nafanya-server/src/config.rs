use clap::Parser;

use nafanya_ai::models::{DEFAULT_DEEPSEEK_MODEL, DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_MODEL};
use nafanya_common::models::ProviderKind;

fn parse_provider(s: &str) -> Result<ProviderKind, String> {
    s.parse::<ProviderKind>().map_err(|e| e.to_string())
}

/// Every option can also come from the environment (or a `.env` file).
#[derive(Parser, Debug, Clone)]
#[command(name = "nafanya")]
#[command(author, version, about = "Nafanya - Telegram chat bot backed by generative AI providers")]
pub struct Args {
    /// Telegram Bot API token.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Postgres connection URL.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// User id seeded into the admin roster on first boot.
    #[arg(long, env = "DEFAULT_ADMIN")]
    pub default_admin: i64,

    /// OpenAI API key. Enables the "oai" provider and image generation.
    #[arg(long, env = "OAI_TOKEN", hide_env_values = true)]
    pub oai_token: Option<String>,

    /// DeepSeek API key. Enables the "deepseek" provider.
    #[arg(long, env = "DS_TOKEN", hide_env_values = true)]
    pub ds_token: Option<String>,

    /// Google AI Studio key. Enables the "google" provider.
    #[arg(long, env = "GOOGLE_TOKEN", hide_env_values = true)]
    pub google_token: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_OPENAI_MODEL)]
    pub openai_model: String,

    #[arg(long, env = "DEEPSEEK_MODEL", default_value = DEFAULT_DEEPSEEK_MODEL)]
    pub deepseek_model: String,

    #[arg(long, env = "GOOGLE_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub google_model: String,

    /// Provider assigned to newly registered chats.
    #[arg(long, env = "DEFAULT_PROVIDER", default_value = "oai", value_parser = parse_provider)]
    pub default_provider: ProviderKind,

    /// Upper bound on generated tokens per answer.
    #[arg(long, env = "MAX_TOKENS", default_value_t = 1000)]
    pub max_tokens: u32,

    /// Per-call timeout for provider requests, in seconds.
    #[arg(long, env = "PROVIDER_TIMEOUT_SECS", default_value_t = 60)]
    pub provider_timeout_secs: u64,

    /// Names the bot answers to, comma separated.
    #[arg(long, env = "BOT_NAMES", value_delimiter = ',', default_value = "Нафаня")]
    pub bot_names: Vec<String>,

    /// Verbose logging.
    #[arg(long = "debug", env = "DEBUG_MODE", default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn token_for(&self, kind: ProviderKind) -> Option<&str> {
        let token = match kind {
            ProviderKind::OpenAi => self.oai_token.as_deref(),
            ProviderKind::Google => self.google_token.as_deref(),
            ProviderKind::DeepSeek => self.ds_token.as_deref(),
        };
        token.filter(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec![
            "nafanya",
            "--bot-token", "123:abc",
            "--database-url", "postgres://localhost/nafanya",
            "--default-admin", "1",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.default_provider, ProviderKind::OpenAi);
        assert_eq!(args.max_tokens, 1000);
        assert_eq!(args.provider_timeout_secs, 60);
        assert_eq!(args.bot_names, vec!["Нафаня".to_string()]);
        assert!(args.token_for(ProviderKind::DeepSeek).is_none());
    }

    #[test]
    fn unknown_default_provider_is_rejected() {
        assert!(parse(&["--default-provider", "claude"]).is_err());
        let args = parse(&["--default-provider", "gemini"]).unwrap();
        assert_eq!(args.default_provider, ProviderKind::Google);
    }

    #[test]
    fn bot_names_are_comma_separated() {
        let args = parse(&["--bot-names", "Нафаня,Nafanya"]).unwrap();
        assert_eq!(args.bot_names, vec!["Нафаня".to_string(), "Nafanya".to_string()]);
    }
}
