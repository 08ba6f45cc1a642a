// Admin dashboard: one persistent message per guild whose buttons edit the panel text

use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::models::guild::GuildConfig;
use crate::utils::config::{defaults, DASHBOARD_SCAN_LIMIT, DASHBOARD_TITLE};
use crate::utils::discord::{ephemeral, input_value, is_admin, live_channel, split_custom_id};
use crate::utils::formatters::truncate;
use crate::utils::parse::{check_length, parse_button_emoji, parse_embed_color, InputError};
use crate::{Data, Error};

/// Button ids are `dashboard:<field key>` or `dashboard:refresh`
pub const EDIT: &str = "dashboard";
/// Form ids are `dashboard_form:<field key>`
pub const FORM: &str = "dashboard_form";
pub const REFRESH: &str = "refresh";

const VALUE_INPUT: &str = "value";
const ADMIN_ONLY: &str = "Only administrators can use the dashboard.";

/// Display fields editable from the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelField {
    Title,
    Description,
    ButtonLabel,
    ButtonEmoji,
    EmbedColor,
    WelcomeMessage,
}

impl PanelField {
    pub const ALL: [PanelField; 6] = [
        PanelField::Title,
        PanelField::Description,
        PanelField::ButtonLabel,
        PanelField::ButtonEmoji,
        PanelField::EmbedColor,
        PanelField::WelcomeMessage,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PanelField::Title => "title",
            PanelField::Description => "description",
            PanelField::ButtonLabel => "label",
            PanelField::ButtonEmoji => "emoji",
            PanelField::EmbedColor => "color",
            PanelField::WelcomeMessage => "welcome",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            PanelField::Title => "Panel Title",
            PanelField::Description => "Panel Description",
            PanelField::ButtonLabel => "Button Label",
            PanelField::ButtonEmoji => "Button Emoji",
            PanelField::EmbedColor => "Embed Color",
            PanelField::WelcomeMessage => "Welcome Message",
        }
    }

    /// Discord's limit for where the value ends up
    fn max_len(self) -> usize {
        match self {
            PanelField::Title => 256,
            PanelField::Description => 4000,
            PanelField::ButtonLabel => 80,
            PanelField::ButtonEmoji => 100,
            PanelField::EmbedColor => 10,
            PanelField::WelcomeMessage => 2000,
        }
    }

    fn input_style(self) -> serenity::InputTextStyle {
        match self {
            PanelField::Description | PanelField::WelcomeMessage => {
                serenity::InputTextStyle::Paragraph
            }
            _ => serenity::InputTextStyle::Short,
        }
    }

    fn default_value(self) -> &'static str {
        match self {
            PanelField::Title => defaults::PANEL_TITLE,
            PanelField::Description => defaults::PANEL_DESCRIPTION,
            PanelField::ButtonLabel => defaults::BUTTON_LABEL,
            PanelField::ButtonEmoji => defaults::BUTTON_EMOJI,
            PanelField::EmbedColor => defaults::EMBED_COLOR,
            PanelField::WelcomeMessage => defaults::WELCOME_MESSAGE,
        }
    }

    /// Stored value, `None` when the default applies
    pub fn current(self, config: &GuildConfig) -> Option<&str> {
        match self {
            PanelField::Title => config.panel_title.as_deref(),
            PanelField::Description => config.panel_description.as_deref(),
            PanelField::ButtonLabel => config.button_label.as_deref(),
            PanelField::ButtonEmoji => config.button_emoji.as_deref(),
            PanelField::EmbedColor => config.embed_color.as_deref(),
            PanelField::WelcomeMessage => config.welcome_message.as_deref(),
        }
    }

    /// Set the field, or clear it with `None`
    pub fn apply(self, config: &mut GuildConfig, value: Option<String>) {
        let slot = match self {
            PanelField::Title => &mut config.panel_title,
            PanelField::Description => &mut config.panel_description,
            PanelField::ButtonLabel => &mut config.button_label,
            PanelField::ButtonEmoji => &mut config.button_emoji,
            PanelField::EmbedColor => &mut config.embed_color,
            PanelField::WelcomeMessage => &mut config.welcome_message,
        };
        *slot = value;
    }

    /// Trim a submitted value; empty means clear
    pub fn validate(self, raw: &str) -> Result<Option<String>, InputError> {
        let value = raw.trim();
        if value.is_empty() {
            return Ok(None);
        }
        check_length(self.label(), value, self.max_len())?;
        match self {
            PanelField::EmbedColor => {
                parse_embed_color(value)?;
            }
            PanelField::ButtonEmoji => parse_button_emoji(value)?,
            _ => {}
        }
        Ok(Some(value.to_string()))
    }
}

/// Dashboard embed and its button rows
pub fn render(config: &GuildConfig) -> (serenity::CreateEmbed, Vec<serenity::CreateActionRow>) {
    let mut embed = serenity::CreateEmbed::new()
        .title(DASHBOARD_TITLE)
        .description(
            "Use the buttons below to edit the ticket panel.\n\
            Submitting an empty value restores the default.",
        )
        .color(config.embed_color());

    for field in PanelField::ALL {
        let value = match field.current(config) {
            Some(v) => truncate(v, 1024),
            None => truncate(&format!("*Default:* {}", field.default_value()), 1024),
        };
        embed = embed.field(field.label(), value, false);
    }

    let mut buttons: Vec<serenity::CreateButton> = PanelField::ALL
        .into_iter()
        .map(|field| {
            serenity::CreateButton::new(format!("{}:{}", EDIT, field.key()))
                .label(field.label())
                .style(serenity::ButtonStyle::Primary)
        })
        .collect();
    buttons.push(
        serenity::CreateButton::new(format!("{}:{}", EDIT, REFRESH))
            .label("Refresh")
            .style(serenity::ButtonStyle::Secondary)
            .emoji('🔄'),
    );

    let rows = buttons
        .chunks(5)
        .map(|chunk| serenity::CreateActionRow::Buttons(chunk.to_vec()))
        .collect();

    (embed, rows)
}

/// A message is the dashboard when the bot wrote it and an embed carries the marker title
pub fn is_dashboard_message<'a>(
    author: serenity::UserId,
    bot: serenity::UserId,
    mut embed_titles: impl Iterator<Item = Option<&'a str>>,
) -> bool {
    author == bot && embed_titles.any(|t| t == Some(DASHBOARD_TITLE))
}

/// What `upsert` does in a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardWrite {
    Edit(serenity::MessageId),
    Post,
}

/// Edit the newest existing dashboard, otherwise post a new one
///
/// `recent` is newest first, as (message, author, embed titles).
pub fn plan_write<'a, T>(
    bot: serenity::UserId,
    recent: impl IntoIterator<Item = (serenity::MessageId, serenity::UserId, T)>,
) -> DashboardWrite
where
    T: IntoIterator<Item = Option<&'a str>>,
{
    recent
        .into_iter()
        .find_map(|(id, author, titles)| {
            is_dashboard_message(author, bot, titles.into_iter()).then_some(id)
        })
        .map_or(DashboardWrite::Post, DashboardWrite::Edit)
}

/// Edit the dashboard in `channel` in place, or post it if none is found
pub async fn upsert(
    ctx: &serenity::Context,
    channel: serenity::ChannelId,
    config: &GuildConfig,
) -> Result<serenity::MessageId, Error> {
    let bot_id = ctx.cache.current_user().id;
    let recent = channel
        .messages(
            &ctx.http,
            serenity::GetMessages::new().limit(DASHBOARD_SCAN_LIMIT),
        )
        .await?;
    let plan = plan_write(
        bot_id,
        recent
            .iter()
            .map(|m| (m.id, m.author.id, m.embeds.iter().map(|e| e.title.as_deref()))),
    );

    let (embed, rows) = render(config);
    match plan {
        DashboardWrite::Edit(message_id) => {
            channel
                .edit_message(
                    &ctx.http,
                    message_id,
                    serenity::EditMessage::new().embed(embed).components(rows),
                )
                .await?;
            Ok(message_id)
        }
        DashboardWrite::Post => {
            let message = channel
                .send_message(
                    &ctx.http,
                    serenity::CreateMessage::new().embed(embed).components(rows),
                )
                .await?;
            Ok(message.id)
        }
    }
}

/// Where a re-render goes: the stored dashboard channel if it still exists
pub fn render_target(
    cache: &serenity::Cache,
    guild_id: serenity::GuildId,
    stored: Option<u64>,
    fallback: serenity::ChannelId,
) -> serenity::ChannelId {
    live_channel(cache, guild_id, stored)
        .map(|c| c.id)
        .unwrap_or(fallback)
}

/// Dashboard button pressed: open the edit form, or refresh
pub async fn handle_button(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    if !is_admin(interaction.member.as_ref().and_then(|m| m.permissions)) {
        interaction
            .create_response(&ctx.http, ephemeral(ADMIN_ONLY))
            .await?;
        return Ok(());
    }

    let guild_id = interaction.guild_id.ok_or("Dashboard only works inside a server")?;
    let config = data.store.get(guild_id);
    let key = split_custom_id(&interaction.data.custom_id).1.unwrap_or_default();

    if key == REFRESH {
        let (embed, rows) = render(&config);
        interaction
            .create_response(
                &ctx.http,
                serenity::CreateInteractionResponse::UpdateMessage(
                    serenity::CreateInteractionResponseMessage::new()
                        .embed(embed)
                        .components(rows),
                ),
            )
            .await?;
        return Ok(());
    }

    let field = PanelField::from_key(key).ok_or("Unknown dashboard field")?;

    let mut input = serenity::CreateInputText::new(field.input_style(), field.label(), VALUE_INPUT)
        .required(false)
        .max_length(field.max_len() as u16)
        .placeholder(truncate(field.default_value(), 100));
    if let Some(current) = field.current(&config) {
        input = input.value(current);
    }

    let modal = serenity::CreateModal::new(format!("{}:{}", FORM, field.key()), format!("Edit {}", field.label()))
        .components(vec![serenity::CreateActionRow::InputText(input)]);

    interaction
        .create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
        .await?;
    Ok(())
}

/// Dashboard form submitted: store the field and re-render
pub async fn handle_form(
    ctx: &serenity::Context,
    interaction: &serenity::ModalInteraction,
    data: &Data,
) -> Result<(), Error> {
    if !is_admin(interaction.member.as_ref().and_then(|m| m.permissions)) {
        interaction
            .create_response(&ctx.http, ephemeral(ADMIN_ONLY))
            .await?;
        return Ok(());
    }

    let guild_id = interaction.guild_id.ok_or("Dashboard only works inside a server")?;
    let field = split_custom_id(&interaction.data.custom_id)
        .1
        .and_then(PanelField::from_key)
        .ok_or("Unknown dashboard field")?;

    let raw = input_value(&interaction.data.components, VALUE_INPUT).unwrap_or_default();
    let value = match field.validate(&raw) {
        Ok(v) => v,
        Err(e) => {
            interaction
                .create_response(&ctx.http, ephemeral(format!("❌ {}", e)))
                .await?;
            return Ok(());
        }
    };

    let cleared = value.is_none();
    data.store.update(guild_id, |c| field.apply(c, value))?;
    info!("Dashboard set {} for guild {} (cleared: {})", field.key(), guild_id, cleared);

    let reply = if cleared {
        format!("✅ **{}** reset to default.", field.label())
    } else {
        format!("✅ **{}** updated.", field.label())
    };
    interaction
        .create_response(&ctx.http, ephemeral(reply))
        .await?;

    let config = data.store.get(guild_id);
    let channel = render_target(
        &ctx.cache,
        guild_id,
        config.dashboard_channel_id,
        interaction.channel_id,
    );
    if let Err(e) = upsert(ctx, channel, &config).await {
        error!("Failed to re-render dashboard in {}: {:?}", channel, e);
    }

    Ok(())
}
