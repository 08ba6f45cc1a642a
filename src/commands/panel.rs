use poise::serenity_prelude as serenity;
use tracing::info;

use crate::features::tickets::panel_message;
use crate::utils::discord::live_channel;
use crate::{Context, Error};

/// Post the ticket panel in this channel
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn panelsetup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?;
    let config = ctx.data().store.get(guild_id);

    // A deleted panel channel lifts the restriction
    let allowed: Option<serenity::ChannelId> =
        live_channel(ctx.cache(), guild_id, config.panel_channel).map(|c| c.id);
    if allowed.is_some_and(|id| id != ctx.channel_id()) {
        ctx.say("❌ Use in the allowed panel channel!").await?;
        return Ok(());
    }

    let (embed, row) = panel_message(&config);
    ctx.send(
        poise::CreateReply::default()
            .embed(embed)
            .components(vec![row]),
    )
    .await?;
    info!("Posted ticket panel in channel {} of guild {}", ctx.channel_id(), guild_id);

    Ok(())
}
