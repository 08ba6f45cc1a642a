use tracing::info;

use crate::features::dashboard;
use crate::{Context, Error};

/// Create (or refresh) the admin dashboard in this channel
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn setupdashboard(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?;
    let channel_id = ctx.channel_id();

    ctx.data()
        .store
        .update(guild_id, |c| c.dashboard_channel_id = Some(channel_id.get()))?;
    let config = ctx.data().store.get(guild_id);

    let message_id = dashboard::upsert(ctx.serenity_context(), channel_id, &config).await?;
    info!(
        "Dashboard for guild {} is message {} in {}",
        guild_id, message_id, channel_id
    );

    Ok(())
}
