// Ticket flow: open button -> (type select) -> form -> private channel -> close prompt

use poise::serenity_prelude as serenity;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::models::guild::GuildConfig;
use crate::utils::config::{defaults, CLOSE_PROMPT_TIMEOUT_SECS, TICKET_CHANNEL_PREFIX};
use crate::utils::discord::{
    defer_ephemeral, ephemeral, input_value, is_admin, live_channel, live_role, split_custom_id,
    update_inert,
};
use crate::utils::formatters::{channel_mention, user_mention};
use crate::utils::parse::{capitalize, parse_button_emoji};
use crate::{Data, Error};

// --- Control ids ---

pub const OPEN_TICKET: &str = "open_ticket";
pub const TYPE_SELECT: &str = "ticket_type";
pub const TICKET_FORM: &str = "ticket_form";
pub const CLOSE_TICKET: &str = "close_ticket";
pub const CLOSE_CONFIRM: &str = "close_confirm";
pub const CLOSE_CANCEL: &str = "close_cancel";

const ISSUE_INPUT: &str = "issue";
const MAX_TYPE_OPTIONS: usize = 25;

/// Metadata kept in a ticket channel's topic
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketTopic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_role_id: Option<u64>,
}

impl TicketTopic {
    /// Temporary role recorded in a topic; malformed topics carry none
    pub fn temp_role(topic: Option<&str>) -> Option<serenity::RoleId> {
        let topic = topic?;
        let parsed = serde_json::from_str::<TicketTopic>(topic).ok()?;
        crate::utils::discord::role_id(parsed.temp_role_id)
    }
}

// --- Naming & permissions ---

pub fn ticket_channel_name(user_id: serenity::UserId, suffix: u16) -> String {
    format!("{}{}-{}", TICKET_CHANNEL_PREFIX, user_id, suffix)
}

pub fn is_ticket_channel(name: &str) -> bool {
    name.starts_with(TICKET_CHANNEL_PREFIX)
}

/// Requester recovered from `ticket-<user id>-<suffix>`
pub fn ticket_owner(name: &str) -> Option<serenity::UserId> {
    let rest = name.strip_prefix(TICKET_CHANNEL_PREFIX)?;
    let id = rest.split('-').next()?.parse::<u64>().ok()?;
    (id != 0).then(|| serenity::UserId::new(id))
}

/// Only the ticket's requester or an administrator may close it
pub fn may_close(
    user: serenity::UserId,
    owner: Option<serenity::UserId>,
    admin: bool,
) -> bool {
    admin || owner == Some(user)
}

/// Overwrites hiding the channel from @everyone and opening it to the
/// requester, the bot and the support role
pub fn ticket_overwrites(
    guild_id: serenity::GuildId,
    requester: serenity::UserId,
    bot: serenity::UserId,
    support_role: Option<serenity::RoleId>,
) -> Vec<serenity::PermissionOverwrite> {
    let member_access = serenity::Permissions::VIEW_CHANNEL
        | serenity::Permissions::SEND_MESSAGES
        | serenity::Permissions::READ_MESSAGE_HISTORY;

    let mut overwrites = vec![
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::empty(),
            deny: serenity::Permissions::VIEW_CHANNEL,
            kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(guild_id.get())),
        },
        serenity::PermissionOverwrite {
            allow: member_access,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(requester),
        },
        serenity::PermissionOverwrite {
            allow: member_access
                | serenity::Permissions::MANAGE_MESSAGES
                | serenity::Permissions::MANAGE_CHANNELS
                | serenity::Permissions::EMBED_LINKS
                | serenity::Permissions::ATTACH_FILES
                | serenity::Permissions::ADD_REACTIONS,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(bot),
        },
    ];

    if let Some(role) = support_role {
        overwrites.push(serenity::PermissionOverwrite {
            allow: member_access,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Role(role),
        });
    }

    overwrites
}

/// Whether the close prompt's deadline (unix seconds, from its control id) has passed
pub fn prompt_expired(deadline: Option<&str>, now: i64) -> bool {
    match deadline.and_then(|d| d.parse::<i64>().ok()) {
        Some(deadline) => now > deadline,
        None => true,
    }
}

// --- Message builders ---

/// The public panel: embed plus the open button
pub fn panel_message(config: &GuildConfig) -> (serenity::CreateEmbed, serenity::CreateActionRow) {
    let embed = serenity::CreateEmbed::new()
        .title(config.panel_title())
        .description(config.panel_description())
        .color(config.embed_color());

    let mut button = serenity::CreateButton::new(OPEN_TICKET)
        .label(config.button_label())
        .style(serenity::ButtonStyle::Success);

    let emoji = parse_button_emoji(config.button_emoji())
        .ok()
        .and_then(|_| serenity::ReactionType::try_from(config.button_emoji().trim()).ok());
    match emoji {
        Some(emoji) => button = button.emoji(emoji),
        None => warn!("Ignoring unusable button emoji {:?}", config.button_emoji()),
    }

    (embed, serenity::CreateActionRow::Buttons(vec![button]))
}

fn close_row() -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![serenity::CreateButton::new(CLOSE_TICKET)
        .label("Close Ticket")
        .style(serenity::ButtonStyle::Danger)
        .emoji('🔒')])
}

fn confirm_row(deadline: i64) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(format!("{}:{}", CLOSE_CONFIRM, deadline))
            .label("Yes, Close")
            .style(serenity::ButtonStyle::Danger),
        serenity::CreateButton::new(format!("{}:{}", CLOSE_CANCEL, deadline))
            .label("Cancel")
            .style(serenity::ButtonStyle::Secondary),
    ])
}

fn type_select(config: &GuildConfig) -> serenity::CreateActionRow {
    let options = config
        .support_types
        .keys()
        .take(MAX_TYPE_OPTIONS)
        .map(|name| serenity::CreateSelectMenuOption::new(capitalize(name), name.as_str()))
        .collect();

    serenity::CreateActionRow::SelectMenu(
        serenity::CreateSelectMenu::new(TYPE_SELECT, serenity::CreateSelectMenuKind::String { options })
            .placeholder("Select support type")
            .min_values(1)
            .max_values(1),
    )
}

fn ticket_form(ticket_type: &str) -> serenity::CreateModal {
    let input = serenity::CreateInputText::new(
        serenity::InputTextStyle::Paragraph,
        "Briefly describe your issue",
        ISSUE_INPUT,
    )
    .required(false)
    .max_length(1000);

    serenity::CreateModal::new(format!("{}:{}", TICKET_FORM, ticket_type), "Create Support Ticket")
        .components(vec![serenity::CreateActionRow::InputText(input)])
}

// --- Handlers ---

/// "Open Ticket" pressed on a panel
pub async fn handle_open(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let guild_id = interaction.guild_id.ok_or("Tickets only work inside a server")?;
    let config = data.store.get(guild_id);

    let response = if config.support_types.is_empty() {
        serenity::CreateInteractionResponse::Modal(ticket_form(defaults::TICKET_TYPE))
    } else {
        serenity::CreateInteractionResponse::Message(
            serenity::CreateInteractionResponseMessage::new()
                .content("Select your support type:")
                .components(vec![type_select(&config)])
                .ephemeral(true),
        )
    };

    interaction.create_response(&ctx.http, response).await?;
    Ok(())
}

/// Support type picked from the select menu
pub async fn handle_type_select(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    _data: &Data,
) -> Result<(), Error> {
    let selected = match &interaction.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => values.first(),
        _ => None,
    }
    .ok_or("No support type selected")?;

    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Modal(ticket_form(selected)),
        )
        .await?;
    Ok(())
}

/// Ticket form submitted: create the channel
pub async fn handle_form(
    ctx: &serenity::Context,
    interaction: &serenity::ModalInteraction,
    data: &Data,
) -> Result<(), Error> {
    let guild_id = interaction.guild_id.ok_or("Tickets only work inside a server")?;

    let ticket_type = split_custom_id(&interaction.data.custom_id)
        .1
        .filter(|t| !t.is_empty())
        .unwrap_or(defaults::TICKET_TYPE)
        .to_lowercase();

    let description = input_value(&interaction.data.components, ISSUE_INPUT)
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| defaults::ISSUE.to_string());

    // Channel creation can outlast the 3 second window, acknowledge first
    interaction
        .create_response(&ctx.http, defer_ephemeral())
        .await?;

    let config = data.store.get(guild_id);

    let reply = match create_ticket(ctx, guild_id, &interaction.user, &config, &ticket_type, &description).await {
        Ok(channel) => format!("Ticket created: {}", channel_mention(channel)),
        Err(e) => {
            error!(
                "Failed to create ticket for user {} in guild {}: {:?}",
                interaction.user.id, guild_id, e
            );
            "❌ Could not create your ticket. Please try again or contact staff.".to_string()
        }
    };

    interaction
        .edit_response(&ctx.http, serenity::EditInteractionResponse::new().content(reply))
        .await?;
    Ok(())
}

async fn create_ticket(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    config: &GuildConfig,
    ticket_type: &str,
    description: &str,
) -> Result<serenity::ChannelId, Error> {
    let preset = config.support_type(ticket_type).cloned().unwrap_or_default();

    let is_category = |c: &serenity::GuildChannel| c.kind == serenity::ChannelType::Category;
    let category = live_channel(&ctx.cache, guild_id, preset.category_id)
        .filter(is_category)
        .or_else(|| live_channel(&ctx.cache, guild_id, config.category_id).filter(is_category));
    let temp_role = live_role(&ctx.cache, guild_id, preset.role_id);
    let support_role = live_role(&ctx.cache, guild_id, config.support_role);
    let bot_id = ctx.cache.current_user().id;

    let suffix: u16 = rand::rng().random_range(1000..=9999);
    let name = ticket_channel_name(user.id, suffix);

    let mut builder = serenity::CreateChannel::new(name)
        .kind(serenity::ChannelType::Text)
        .permissions(ticket_overwrites(
            guild_id,
            user.id,
            bot_id,
            support_role.as_ref().map(|r| r.id),
        ));
    if let Some(category) = &category {
        builder = builder.category(category.id);
    }
    if let Some(role) = &temp_role {
        let topic = TicketTopic {
            temp_role_id: Some(role.id.get()),
        };
        builder = builder.topic(serde_json::to_string(&topic)?);
    }

    let channel = guild_id.create_channel(&ctx.http, builder).await?;
    info!(
        "Opened ticket {} ({}) for user {} in guild {}",
        channel.name, ticket_type, user.id, guild_id
    );

    if let Some(role) = &temp_role {
        if let Err(e) = ctx
            .http
            .add_member_role(guild_id, user.id, role.id, Some("Support ticket opened"))
            .await
        {
            warn!("Failed to grant ticket role {} to {}: {:?}", role.id, user.id, e);
        }
    }

    let welcome = serenity::CreateEmbed::new()
        .title("Ticket Created 🎫")
        .description(format!(
            "{}\n**Type:** {}",
            config.render_welcome(&user_mention(user.id)),
            capitalize(ticket_type)
        ))
        .color(config.embed_color());

    channel
        .id
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(welcome))
        .await?;
    channel
        .id
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new()
                .content(format!("**Issue:** {}", description))
                .components(vec![close_row()]),
        )
        .await?;

    Ok(channel.id)
}

/// The interaction's channel, if it is a ticket channel
async fn ticket_channel(
    ctx: &serenity::Context,
    channel: serenity::ChannelId,
) -> Result<Option<serenity::GuildChannel>, Error> {
    let channel = channel.to_channel(ctx).await?.guild();
    Ok(channel.filter(|c| is_ticket_channel(&c.name)))
}

/// "Close Ticket" pressed: ask for confirmation
pub async fn handle_close(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    _data: &Data,
) -> Result<(), Error> {
    if ticket_channel(ctx, interaction.channel_id).await?.is_none() {
        interaction
            .create_response(&ctx.http, ephemeral("Only in ticket channels."))
            .await?;
        return Ok(());
    }

    let deadline = chrono::Utc::now().timestamp() + CLOSE_PROMPT_TIMEOUT_SECS;
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content("⚠️ Are you sure you want to close this ticket?")
                    .components(vec![confirm_row(deadline)]),
            ),
        )
        .await?;
    Ok(())
}

/// "Yes, Close" pressed
pub async fn handle_close_confirm(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    _data: &Data,
) -> Result<(), Error> {
    let deadline = split_custom_id(&interaction.data.custom_id).1;
    if prompt_expired(deadline, chrono::Utc::now().timestamp()) {
        interaction
            .create_response(&ctx.http, update_inert("Close prompt expired."))
            .await?;
        return Ok(());
    }

    let Some(channel) = ticket_channel(ctx, interaction.channel_id).await? else {
        interaction
            .create_response(&ctx.http, ephemeral("Only in ticket channels."))
            .await?;
        return Ok(());
    };

    let owner = ticket_owner(&channel.name);
    let admin = is_admin(interaction.member.as_ref().and_then(|m| m.permissions));
    if !may_close(interaction.user.id, owner, admin) {
        interaction
            .create_response(
                &ctx.http,
                ephemeral("Only the ticket owner or an admin can close this ticket."),
            )
            .await?;
        return Ok(());
    }

    if let (Some(role_id), Some(owner)) = (TicketTopic::temp_role(channel.topic.as_deref()), owner) {
        revoke_temp_role(ctx, channel.guild_id, owner, role_id).await;
    }

    interaction
        .create_response(&ctx.http, update_inert("🔒 Ticket closing..."))
        .await?;
    channel.id.delete(&ctx.http).await?;
    info!(
        "Closed ticket {} in guild {} (by {})",
        channel.name, channel.guild_id, interaction.user.id
    );

    Ok(())
}

async fn revoke_temp_role(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    owner: serenity::UserId,
    role_id: serenity::RoleId,
) {
    let member = match guild_id.member(ctx, owner).await {
        Ok(m) => m,
        Err(e) => {
            debug!("Ticket owner {} not found, skipping role revoke: {:?}", owner, e);
            return;
        }
    };

    if !member.roles.contains(&role_id) {
        return;
    }

    if let Err(e) = ctx
        .http
        .remove_member_role(guild_id, owner, role_id, Some("Support ticket closed"))
        .await
    {
        warn!("Failed to revoke ticket role {} from {}: {:?}", role_id, owner, e);
    }
}

/// "Cancel" pressed
pub async fn handle_close_cancel(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    _data: &Data,
) -> Result<(), Error> {
    let deadline = split_custom_id(&interaction.data.custom_id).1;
    let text = if prompt_expired(deadline, chrono::Utc::now().timestamp()) {
        "Close prompt expired."
    } else {
        "Close cancelled."
    };

    interaction
        .create_response(&ctx.http, update_inert(text))
        .await?;
    Ok(())
}
