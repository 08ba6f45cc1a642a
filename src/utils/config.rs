// Centralized configuration for the ticket bot

/// Prefix used when `COMMAND_PREFIX` is not set
pub const DEFAULT_PREFIX: &str = "!";

/// Config file used when `TICKET_CONFIG_PATH` is not set
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Ticket channels are named `ticket-<user id>-<suffix>`
pub const TICKET_CHANNEL_PREFIX: &str = "ticket-";

/// Seconds before a close confirmation prompt goes inert
pub const CLOSE_PROMPT_TIMEOUT_SECS: i64 = 60;

/// Embed title that marks the dashboard message
pub const DASHBOARD_TITLE: &str = "⚙️ Ticket Dashboard";

/// How many recent messages are scanned when looking for the dashboard
pub const DASHBOARD_SCAN_LIMIT: u8 = 50;

/// Fallback text for display fields
pub mod defaults {
    pub const PANEL_TITLE: &str = "📩 Support Tickets";
    pub const PANEL_DESCRIPTION: &str = "Click to open a private ticket.";
    pub const BUTTON_LABEL: &str = "Open Ticket";
    pub const BUTTON_EMOJI: &str = "🎫";
    /// Same value as `colors::TICKET`
    pub const EMBED_COLOR: &str = "#00ff99";
    pub const WELCOME_MESSAGE: &str = "{user}, thank you for reaching out!";
    pub const TICKET_TYPE: &str = "general";
    pub const ISSUE: &str = "No description provided.";
}

/// Discord embed colors
pub mod colors {
    pub const TICKET: u32 = 0x00ff99;
    pub const INFO: u32 = 0x3498db;
}

/// Process settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotSettings {
    pub token: String,
    pub prefix: String,
    pub config_path: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("DISCORD_TOKEN (or TOKEN) must be set")]
    MissingToken,
}

impl BotSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("DISCORD_TOKEN")
            .or_else(|| get("TOKEN"))
            .ok_or(SettingsError::MissingToken)?;

        Ok(Self {
            token,
            prefix: get("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            config_path: get("TICKET_CONFIG_PATH")
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_color_text_matches_ticket_color() {
        assert_eq!(
            crate::utils::parse::parse_embed_color(defaults::EMBED_COLOR),
            Ok(colors::TICKET)
        );
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(
            BotSettings::from_lookup(lookup(&[])),
            Err(SettingsError::MissingToken)
        );
        assert_eq!(
            BotSettings::from_lookup(lookup(&[("DISCORD_TOKEN", "  ")])),
            Err(SettingsError::MissingToken)
        );
    }

    #[test]
    fn test_defaults() {
        let settings = BotSettings::from_lookup(lookup(&[("DISCORD_TOKEN", "abc")])).unwrap();
        assert_eq!(settings.token, "abc");
        assert_eq!(settings.prefix, "!");
        assert_eq!(settings.config_path, "config.json");
    }

    #[test]
    fn test_legacy_token_and_overrides() {
        let settings = BotSettings::from_lookup(lookup(&[
            ("TOKEN", "legacy"),
            ("COMMAND_PREFIX", "?"),
            ("TICKET_CONFIG_PATH", "/data/tickets.json"),
        ]))
        .unwrap();
        assert_eq!(settings.token, "legacy");
        assert_eq!(settings.prefix, "?");
        assert_eq!(settings.config_path, "/data/tickets.json");
    }
}
