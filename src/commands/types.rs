use poise::serenity_prelude as serenity;
use tracing::info;

use crate::models::guild::{GuildConfig, SupportType};
use crate::utils::formatters::{list_or_none, role_mention};
use crate::{Context, Error};

/// Select menus hold at most 25 options
pub const MAX_SUPPORT_TYPES: usize = 25;
pub const MAX_TYPE_NAME_LEN: usize = 50;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("Type names must be 1-{} characters.", MAX_TYPE_NAME_LEN)]
    BadName,
    #[error("A server can have at most {} support types.", MAX_SUPPORT_TYPES)]
    TooMany,
}

/// Add or replace a support type; names are stored lowercase
pub fn set_support_type(
    config: &mut GuildConfig,
    name: &str,
    preset: SupportType,
) -> Result<String, TypeError> {
    let key = name.trim().to_lowercase();
    if key.is_empty() || key.chars().count() > MAX_TYPE_NAME_LEN {
        return Err(TypeError::BadName);
    }
    if !config.support_types.contains_key(&key) && config.support_types.len() >= MAX_SUPPORT_TYPES {
        return Err(TypeError::TooMany);
    }
    config.support_types.insert(key.clone(), preset);
    Ok(key)
}

/// Add or replace a support type with optional category/role overrides
///
/// Usage: `!settype <TypeName> [Category] [Role]`
/// Example: `!settype billing Billing @Support`
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn settype(
    ctx: Context<'_>,
    #[description = "Type name"] name: Option<String>,
    #[description = "Category for this type"] category: Option<serenity::GuildChannel>,
    #[description = "Role granted while the ticket is open"] role: Option<serenity::Role>,
) -> Result<(), Error> {
    let Some(name) = name else {
        ctx.say("❌ Usage: `!settype <TypeName> [Category] [Role]`").await?;
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?;

    if let Some(c) = &category {
        if c.kind != serenity::ChannelType::Category || c.guild_id != guild_id {
            ctx.say(format!("❌ **{}** is not a category.", c.name)).await?;
            return Ok(());
        }
    }

    let preset = SupportType {
        category_id: category.as_ref().map(|c| c.id.get()),
        role_id: role.as_ref().map(|r| r.id.get()),
    };

    let result = ctx
        .data()
        .store
        .update(guild_id, |c| set_support_type(c, &name, preset))?;

    match result {
        Ok(key) => {
            info!("Support type '{}' set for guild {}", key, guild_id);
            ctx.say(format!(
                "✅ Type '{}' set → Category: {}, Role: {}",
                name,
                category.as_ref().map(|c| c.name.as_str()).unwrap_or("Default"),
                role.as_ref()
                    .map(|r| role_mention(r.id))
                    .unwrap_or_else(|| "None".to_string()),
            ))
            .await?;
        }
        Err(e) => {
            ctx.say(format!("❌ {}", e)).await?;
        }
    }

    Ok(())
}

/// Remove a support type
///
/// Usage: `!removetype <TypeName>`
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn removetype(
    ctx: Context<'_>,
    #[rest]
    #[description = "Type name"]
    type_name: Option<String>,
) -> Result<(), Error> {
    let Some(type_name) = type_name.filter(|t| !t.trim().is_empty()) else {
        ctx.say("❌ Usage: `!removetype <TypeName>`").await?;
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?;
    let key = type_name.trim().to_lowercase();

    // Only write when something actually changes
    let existing = ctx.data().store.get(guild_id);
    if !existing.support_types.contains_key(&key) {
        ctx.say(format!(
            "❌ Type not found. Existing types: {}",
            list_or_none(existing.support_types.keys())
        ))
        .await?;
        return Ok(());
    }

    ctx.data().store.update(guild_id, |c| {
        c.support_types.remove(&key);
    })?;
    info!("Support type '{}' removed for guild {}", key, guild_id);

    ctx.say(format!("✅ Support type **'{}'** removed successfully.", type_name.trim()))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_lowercased() {
        let mut config = GuildConfig::default();
        let key = set_support_type(&mut config, " Billing ", SupportType::default()).unwrap();
        assert_eq!(key, "billing");
        assert!(config.support_types.contains_key("billing"));
    }

    #[test]
    fn test_replace_existing_type() {
        let mut config = GuildConfig::default();
        set_support_type(&mut config, "tech", SupportType { category_id: Some(1), role_id: None }).unwrap();
        set_support_type(&mut config, "TECH", SupportType { category_id: None, role_id: Some(2) }).unwrap();
        assert_eq!(config.support_types.len(), 1);
        assert_eq!(config.support_types["tech"].role_id, Some(2));
    }

    #[test]
    fn test_type_limits() {
        let mut config = GuildConfig::default();
        assert_eq!(
            set_support_type(&mut config, "  ", SupportType::default()),
            Err(TypeError::BadName)
        );

        for i in 0..MAX_SUPPORT_TYPES {
            set_support_type(&mut config, &format!("type{}", i), SupportType::default()).unwrap();
        }
        assert_eq!(
            set_support_type(&mut config, "one-more", SupportType::default()),
            Err(TypeError::TooMany)
        );
        // replacing is still allowed at the limit
        assert!(set_support_type(&mut config, "type0", SupportType::default()).is_ok());
    }
}
