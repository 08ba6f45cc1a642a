// Help command - show usage guide

use poise::serenity_prelude as serenity;
use crate::{Context, Error};
use crate::utils::config::colors;

/// Show help and usage guide
#[poise::command(prefix_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let p = ctx.prefix();

    let embed = serenity::CreateEmbed::new()
        .title("🎫 Ticket Bot - Help")
        .description("Private support tickets opened from a button")
        .color(colors::INFO)
        .field(
            "⚙️ Setup (Administrator)",
            format!(
                "`{p}role <@role|name>` - Support role that sees every ticket\n\
                `{p}category <name>` - Default category for tickets\n\
                `{p}panel #channel` - Restrict the panel to one channel\n\
                `{p}panelsetup` - Post the ticket panel here"
            ),
            false,
        )
        .field(
            "🗂️ Support Types (Administrator)",
            format!(
                "`{p}settype <name> [category] [role]` - Add or replace a type\n\
                `{p}removetype <name>` - Remove a type"
            ),
            false,
        )
        .field(
            "🖥️ Dashboard (Administrator)",
            format!("`{p}setupdashboard` - Edit panel text and colors with buttons"),
            false,
        )
        .field(
            "📋 Everyone",
            format!(
                "`{p}show` - Current settings\n\
                `{p}ping` - Check the bot is alive"
            ),
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(
            "Built with Serenity & Poise",
        ));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
