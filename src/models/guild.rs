use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::utils::config::{colors, defaults};
use crate::utils::parse::parse_embed_color;

/// Per-type overrides for ticket routing
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SupportType {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub role_id: Option<u64>,
}

/// Guild (Server) specific ticket configuration
///
/// Only ids are stored. Every id has to be resolved against the live guild
/// on use, and a missing role/channel counts as "not set".
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GuildConfig {
    /// Role that can see every ticket
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub support_role: Option<u64>,
    /// Default category for new ticket channels
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    /// Channel `panelsetup` is restricted to
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub panel_channel: Option<u64>,
    /// Channel holding the admin dashboard
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub dashboard_channel_id: Option<u64>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub panel_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub panel_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub button_label: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub button_emoji: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub embed_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,

    /// Type name (lowercase) -> overrides
    #[serde(default, deserialize_with = "lenient_types", skip_serializing_if = "BTreeMap::is_empty")]
    pub support_types: BTreeMap<String, SupportType>,

    /// Keys this version does not know about, written back untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GuildConfig {
    pub fn panel_title(&self) -> &str {
        self.panel_title.as_deref().unwrap_or(defaults::PANEL_TITLE)
    }

    pub fn panel_description(&self) -> &str {
        self.panel_description
            .as_deref()
            .unwrap_or(defaults::PANEL_DESCRIPTION)
    }

    pub fn button_label(&self) -> &str {
        self.button_label.as_deref().unwrap_or(defaults::BUTTON_LABEL)
    }

    pub fn button_emoji(&self) -> &str {
        self.button_emoji.as_deref().unwrap_or(defaults::BUTTON_EMOJI)
    }

    /// Stored color, or the default when unset or unparsable
    pub fn embed_color(&self) -> u32 {
        self.embed_color
            .as_deref()
            .and_then(|c| parse_embed_color(c).ok())
            .unwrap_or(colors::TICKET)
    }

    pub fn welcome_message(&self) -> &str {
        self.welcome_message
            .as_deref()
            .unwrap_or(defaults::WELCOME_MESSAGE)
    }

    /// Welcome text with `{user}` replaced by the requester's mention
    pub fn render_welcome(&self, user_mention: &str) -> String {
        self.welcome_message().replace("{user}", user_mention)
    }

    pub fn support_type(&self, name: &str) -> Option<&SupportType> {
        self.support_types.get(&name.to_lowercase())
    }
}

/// Accepts a JSON number or a numeric string; anything else is absence
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    })
}

/// Non-string text values are ignored rather than failing the whole record
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_types<'de, D>(deserializer: D) -> Result<BTreeMap<String, SupportType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Object(map) = value else {
        return Ok(BTreeMap::new());
    };

    let mut types = BTreeMap::new();
    for (name, preset) in map {
        let preset = serde_json::from_value::<SupportType>(preset).unwrap_or_default();
        let key = name.to_lowercase();
        if types.contains_key(&key) {
            // the already-lowercase spelling wins
            warn!("Support types {:?} and {:?} collide, keeping the lowercase one", name, key);
            if name != key {
                continue;
            }
        }
        types.insert(key, preset);
    }
    Ok(types)
}
