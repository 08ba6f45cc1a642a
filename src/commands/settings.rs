use poise::serenity_prelude as serenity;
use tracing::info;

use crate::utils::config::colors;
use crate::utils::discord::{live_channel, live_role};
use crate::utils::formatters::{channel_mention, list_or_none, role_mention, truncate};
use crate::utils::parse::{capitalize, parse_role_mention};
use crate::{Context, Error};

/// Match `<@&id>` or a case-insensitive role name against (id, name) pairs
pub fn match_role<'a>(roles: impl IntoIterator<Item = (u64, &'a str)>, input: &str) -> Option<u64> {
    let input = input.trim();
    let mut roles = roles.into_iter();
    match parse_role_mention(input) {
        Some(id) => roles.find(|(rid, _)| *rid == id).map(|(rid, _)| rid),
        None => {
            let wanted = input.to_lowercase();
            roles
                .find(|(_, name)| name.to_lowercase() == wanted)
                .map(|(rid, _)| rid)
        }
    }
}

/// Case-insensitive category lookup
pub fn match_category<'a>(
    categories: impl IntoIterator<Item = (u64, &'a str)>,
    name: &str,
) -> Option<u64> {
    let wanted = name.trim().to_lowercase();
    categories
        .into_iter()
        .find(|(_, n)| n.to_lowercase() == wanted)
        .map(|(id, _)| id)
}

/// Set the support role that can see every ticket
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn role(
    ctx: Context<'_>,
    #[rest]
    #[description = "Role mention or name"]
    role_input: Option<String>,
) -> Result<(), Error> {
    let Some(role_input) = role_input.filter(|r| !r.trim().is_empty()) else {
        ctx.say("❌ Usage: `!role @Support` or `!role Support`").await?;
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?;

    let found = {
        let Some(guild) = ctx.guild() else {
            return Err("Server is not cached yet, try again shortly.".into());
        };
        match_role(
            guild.roles.values().map(|r| (r.id.get(), r.name.as_str())),
            &role_input,
        )
    };

    let Some(role_id) = found else {
        ctx.say("❌ Role not found.").await?;
        return Ok(());
    };

    ctx.data()
        .store
        .update(guild_id, |c| c.support_role = Some(role_id))?;
    info!("Support role for guild {} set to {}", guild_id, role_id);

    ctx.say(format!("✅ Support role set to {}", role_mention(role_id)))
        .await?;
    Ok(())
}

/// Set the default category for ticket channels
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn category(
    ctx: Context<'_>,
    #[rest]
    #[description = "Category name"]
    cat_name: Option<String>,
) -> Result<(), Error> {
    let Some(cat_name) = cat_name.filter(|c| !c.trim().is_empty()) else {
        ctx.say("❌ Usage: `!category ticketing`").await?;
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?;

    let (found, available) = {
        let Some(guild) = ctx.guild() else {
            return Err("Server is not cached yet, try again shortly.".into());
        };
        let categories: Vec<(u64, String)> = guild
            .channels
            .values()
            .filter(|c| c.kind == serenity::ChannelType::Category)
            .map(|c| (c.id.get(), c.name.clone()))
            .collect();
        let found = match_category(categories.iter().map(|(id, n)| (*id, n.as_str())), &cat_name)
            .and_then(|id| categories.iter().find(|(cid, _)| *cid == id).cloned());
        (found, categories.into_iter().map(|(_, n)| n).collect::<Vec<_>>())
    };

    let Some((category_id, name)) = found else {
        ctx.say(format!("❌ Not found. Available: {}", list_or_none(&available)))
            .await?;
        return Ok(());
    };

    ctx.data()
        .store
        .update(guild_id, |c| c.category_id = Some(category_id))?;
    info!("Default category for guild {} set to {}", guild_id, category_id);

    ctx.say(format!("✅ Default category set to **{}**", name))
        .await?;
    Ok(())
}

/// Restrict `panelsetup` to one channel
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn panel(
    ctx: Context<'_>,
    #[description = "Channel for the ticket panel"] channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?;

    let Some(channel) = channel.filter(|c| c.guild_id == guild_id && c.kind == serenity::ChannelType::Text)
    else {
        ctx.say("❌ Usage: `!panel #support-channel`").await?;
        return Ok(());
    };

    ctx.data()
        .store
        .update(guild_id, |c| c.panel_channel = Some(channel.id.get()))?;
    info!("Panel channel for guild {} set to {}", guild_id, channel.id);

    ctx.say(format!("✅ Restricted to {}", channel_mention(channel.id)))
        .await?;
    Ok(())
}

/// Show the current ticket settings
#[poise::command(prefix_command, guild_only)]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?;
    let config = ctx.data().store.get(guild_id);
    let cache = ctx.cache();

    let support_role = live_role(cache, guild_id, config.support_role)
        .map(|r| role_mention(r.id))
        .unwrap_or_else(|| "Not set".to_string());
    let category = live_channel(cache, guild_id, config.category_id)
        .map(|c| c.name)
        .unwrap_or_else(|| "Not set".to_string());
    let panel_channel = live_channel(cache, guild_id, config.panel_channel)
        .map(|c| channel_mention(c.id))
        .unwrap_or_else(|| "Any".to_string());
    let dashboard_channel = live_channel(cache, guild_id, config.dashboard_channel_id)
        .map(|c| channel_mention(c.id))
        .unwrap_or_else(|| "Not set".to_string());

    let types = if config.support_types.is_empty() {
        "None set".to_string()
    } else {
        config
            .support_types
            .iter()
            .map(|(name, preset)| {
                let cat = live_channel(cache, guild_id, preset.category_id)
                    .map(|c| c.name)
                    .unwrap_or_else(|| "Default".to_string());
                let role = live_role(cache, guild_id, preset.role_id)
                    .map(|r| role_mention(r.id))
                    .unwrap_or_else(|| "None".to_string());
                format!("- **{}**: Cat: `{}`, Role: {}", capitalize(name), cat, role)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title("Current Settings")
        .color(colors::TICKET)
        .field("Support Role", support_role, false)
        .field("Default Category", category, false)
        .field("Panel Channel", panel_channel, false)
        .field("Dashboard Channel", dashboard_channel, false)
        .field(
            "Panel",
            format!(
                "**{}**\nButton: {} {}",
                config.panel_title(),
                config.button_emoji(),
                config.button_label()
            ),
            false,
        )
        .field("Support Types", truncate(&types, 1024), false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> Vec<(u64, &'static str)> {
        vec![(10, "Support"), (11, "Moderators"), (12, "@everyone")]
    }

    #[test]
    fn test_match_role_by_mention() {
        assert_eq!(match_role(roles(), "<@&11>"), Some(11));
        assert_eq!(match_role(roles(), "<@&99>"), None);
    }

    #[test]
    fn test_match_role_by_name() {
        assert_eq!(match_role(roles(), "support"), Some(10));
        assert_eq!(match_role(roles(), "  MODERATORS "), Some(11));
        assert_eq!(match_role(roles(), "Admins"), None);
    }

    #[test]
    fn test_match_category() {
        let cats = vec![(1, "Ticketing"), (2, "General Chat")];
        assert_eq!(match_category(cats.clone(), "ticketing"), Some(1));
        assert_eq!(match_category(cats.clone(), "general chat"), Some(2));
        assert_eq!(match_category(cats, "voice"), None);
    }
}
