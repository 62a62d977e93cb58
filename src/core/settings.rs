use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub twitch: TwitchSettings,
    pub discord: DiscordSettings,
    pub polling: PollingSettings,
    pub http: HttpSettings,
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitchSettings {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub api_url: String,
    pub page_size: u32,
}

impl Default for TwitchSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            auth_url: "https://id.twitch.tv".to_string(),
            api_url: "https://api.twitch.tv".to_string(),
            page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    pub bot_token: String,
    pub api_url: String,
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_url: "https://discord.com/api/v10".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub interval_mins: u64,
    pub detail_cap: usize,
    pub body_budget: usize,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_mins: 5,
            detail_cap: 5,
            body_budget: 4096,
        }
    }
}

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_mins.saturating_mul(60))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl HttpSettings {
    pub fn client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .context("Failed to build HTTP client")
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("livewatch").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config directory")?;
        let mut settings = Self::load_from(&path)?;
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(?path, "Loaded config");
        Ok(settings)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("LIVEWATCH_CLIENT_ID") {
            self.twitch.client_id = id;
        }
        if let Some(secret) = lookup("LIVEWATCH_CLIENT_SECRET") {
            self.twitch.client_secret = secret;
        }
        if let Some(token) = lookup("LIVEWATCH_DISCORD_TOKEN") {
            self.discord.bot_token = token;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.twitch.client_id.trim().is_empty() || self.twitch.client_secret.trim().is_empty() {
            anyhow::bail!("twitch.client_id and twitch.client_secret must be set");
        }
        if self.discord.bot_token.trim().is_empty() {
            anyhow::bail!("discord.bot_token must be set");
        }
        if self.polling.interval_mins == 0 {
            anyhow::bail!("polling.interval_mins must be at least 1");
        }
        if !(1..=100).contains(&self.twitch.page_size) {
            anyhow::bail!(
                "twitch.page_size must be between 1 and 100, got {}",
                self.twitch.page_size
            );
        }
        // Room for the overflow heading plus the truncation marker.
        if self.polling.body_budget < 64 {
            anyhow::bail!(
                "polling.body_budget must be at least 64, got {}",
                self.polling.body_budget
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn configured() -> Settings {
        let mut settings = Settings::default();
        settings.twitch.client_id = "id".to_string();
        settings.twitch.client_secret = "secret".to_string();
        settings.discord.bot_token = "bot".to_string();
        settings
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.twitch.auth_url, "https://id.twitch.tv");
        assert_eq!(settings.twitch.page_size, 100);
        assert_eq!(settings.polling.interval(), Duration::from_secs(300));
        assert_eq!(settings.polling.detail_cap, 5);
        assert_eq!(settings.polling.body_budget, 4096);
        assert_eq!(settings.http.timeout_secs, 10);
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_validation() {
        assert!(Settings::default().validate().is_err());

        let mut settings = configured();
        assert!(settings.validate().is_ok());

        settings.polling.interval_mins = 0;
        assert!(settings.validate().is_err());

        let mut settings = configured();
        settings.twitch.page_size = 101;
        assert!(settings.validate().is_err());

        let mut settings = configured();
        settings.polling.body_budget = 10;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            debug = true

            [twitch]
            client_id = "abc"
            client_secret = "def"

            [discord]
            bot_token = "xyz"

            [polling]
            interval_mins = 2
            detail_cap = 3
        "#;

        let settings: Settings = toml::from_str(toml).unwrap();
        assert!(settings.debug);
        assert_eq!(settings.twitch.client_id, "abc");
        assert_eq!(settings.twitch.api_url, "https://api.twitch.tv");
        assert_eq!(settings.discord.bot_token, "xyz");
        assert_eq!(settings.polling.interval(), Duration::from_secs(120));
        assert_eq!(settings.polling.detail_cap, 3);
        assert_eq!(settings.polling.body_budget, 4096);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LIVEWATCH_CLIENT_SECRET", "from-env"),
            ("LIVEWATCH_DISCORD_TOKEN", "bot-env"),
        ]
        .into_iter()
        .collect();

        let mut settings = configured();
        settings.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.twitch.client_id, "id");
        assert_eq!(settings.twitch.client_secret, "from-env");
        assert_eq!(settings.discord.bot_token, "bot-env");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings.polling.interval_mins, 5);
    }
}
