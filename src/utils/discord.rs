// Helpers over the serenity model shared by commands and interaction handlers

use poise::serenity_prelude as serenity;

/// Whether an interaction member's resolved permissions include Administrator
pub fn is_admin(permissions: Option<serenity::Permissions>) -> bool {
    permissions.is_some_and(|p| p.administrator())
}

/// Ephemeral text reply to a component or modal interaction
pub fn ephemeral(content: impl Into<String>) -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

/// Private "thinking..." acknowledgement, answered later with `edit_response`
pub fn defer_ephemeral() -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::Defer(
        serenity::CreateInteractionResponseMessage::new().ephemeral(true),
    )
}

/// Replace the interaction's message text and drop its controls
pub fn update_inert(content: impl Into<String>) -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::UpdateMessage(
        serenity::CreateInteractionResponseMessage::new()
            .content(content)
            .components(vec![]),
    )
}

/// Split `name:arg` control ids
pub fn split_custom_id(custom_id: &str) -> (&str, Option<&str>) {
    match custom_id.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (custom_id, None),
    }
}

/// Value typed into a modal text input
pub fn input_value(rows: &[serenity::ActionRow], custom_id: &str) -> Option<String> {
    rows.iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                input.value.clone()
            }
            _ => None,
        })
}

pub fn role_id(id: Option<u64>) -> Option<serenity::RoleId> {
    id.filter(|&id| id != 0).map(serenity::RoleId::new)
}

pub fn channel_id(id: Option<u64>) -> Option<serenity::ChannelId> {
    id.filter(|&id| id != 0).map(serenity::ChannelId::new)
}

/// A stored role id resolved against the cached guild; deleted roles are `None`
pub fn live_role(
    cache: &serenity::Cache,
    guild_id: serenity::GuildId,
    id: Option<u64>,
) -> Option<serenity::Role> {
    let id = role_id(id)?;
    let guild = cache.guild(guild_id)?;
    guild.roles.get(&id).cloned()
}

/// A stored channel id resolved against the cached guild; deleted channels are `None`
pub fn live_channel(
    cache: &serenity::Cache,
    guild_id: serenity::GuildId,
    id: Option<u64>,
) -> Option<serenity::GuildChannel> {
    let id = channel_id(id)?;
    let guild = cache.guild(guild_id)?;
    guild.channels.get(&id).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_custom_id() {
        assert_eq!(split_custom_id("open_ticket"), ("open_ticket", None));
        assert_eq!(split_custom_id("close_confirm:170"), ("close_confirm", Some("170")));
        assert_eq!(split_custom_id("a:b:c"), ("a", Some("b:c")));
    }

    #[test]
    fn test_is_admin() {
        assert!(is_admin(Some(serenity::Permissions::ADMINISTRATOR)));
        assert!(!is_admin(Some(serenity::Permissions::MANAGE_GUILD)));
        assert!(!is_admin(None));
    }

    #[test]
    fn test_zero_ids_are_unset() {
        assert_eq!(role_id(Some(0)), None);
        assert_eq!(channel_id(None), None);
        assert_eq!(role_id(Some(5)), Some(serenity::RoleId::new(5)));
    }

    #[test]
    fn test_ephemeral_flag() {
        let json = serde_json::to_value(ephemeral("nope")).unwrap();
        assert_eq!(json["type"], 4);
        assert_eq!(json["data"]["content"], "nope");
    }

    #[test]
    fn test_defer_is_private() {
        let json = serde_json::to_value(defer_ephemeral()).unwrap();
        assert_eq!(json["type"], 5);
        assert!(!json["data"]["flags"].is_null());
    }
}
