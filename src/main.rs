// Ticket Bot
// Private support tickets opened from a panel button, configured per server

mod commands;
mod features;
mod models;
mod store;
mod utils;

use std::env;
use std::sync::Arc;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::features::interactions::ControlRegistry;
use crate::store::{ConfigStore, JsonFileBackend};
use crate::utils::config::BotSettings;

/// State shared by every command and interaction handler
pub struct Data {
    pub store: Arc<ConfigStore>,
    pub controls: ControlRegistry,
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Register all text commands
fn get_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        commands::ping::ping(),
        commands::settings::role(),
        commands::settings::category(),
        commands::settings::panel(),
        commands::settings::show(),
        commands::panel::panelsetup(),
        commands::dashboard::setupdashboard(),
        commands::types::settype(),
        commands::types::removetype(),
        commands::help::help(),
    ]
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Command {} failed: {:?}", ctx.command().name, error);
            let _ = ctx.say(format!("⚠️ Error: {}", error)).await;
        }
        poise::FrameworkError::MissingUserPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            let needed = missing_permissions
                .map(|p| p.to_string())
                .unwrap_or_else(|| "Administrator".to_string());
            let _ = ctx
                .say(format!("⚠️ You need the {} permission to use this.", needed))
                .await;
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            let _ = ctx.say(format!("⚠️ Error: {}", error)).await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {}
        err => {
            if let Err(e) = poise::builtins::on_error(err).await {
                warn!("Error while handling framework error: {:?}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "ticket_bot=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = BotSettings::from_env()?;

    info!("Starting Ticket Bot...");

    let store = Arc::new(ConfigStore::open(Box::new(JsonFileBackend::new(
        &settings.config_path,
    ))));
    info!("Guild configs at {}", settings.config_path);

    // Setup framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(settings.prefix.clone()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(features::interactions::handle_event(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |_ctx, _ready, _framework| {
            Box::pin(async move {
                info!("Bot is ready! Control registry built.");
                Ok(Data {
                    store,
                    controls: ControlRegistry::build(),
                })
            })
        })
        .build();

    // MESSAGE_CONTENT is privileged, enable it in the Discord Dev Portal for prefix commands
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut client = serenity::ClientBuilder::new(&settings.token, intents)
        .framework(framework)
        .await
        .context("Failed to create client")?;

    // Run with graceful shutdown
    let shard_manager = client.shard_manager.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to register Ctrl+C handler: {:?}", e);
            return;
        }
        info!("Shutting down...");
        shard_manager.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
        return Err(why).context("Gateway client stopped");
    }

    info!("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_commands_registered() {
        let names: HashSet<String> = get_commands().into_iter().map(|c| c.name).collect();
        for expected in [
            "ping",
            "role",
            "category",
            "panel",
            "show",
            "panelsetup",
            "setupdashboard",
            "settype",
            "removetype",
            "help",
        ] {
            assert!(names.contains(expected), "missing command {}", expected);
        }
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_admin_gating() {
        let open_to_all: HashSet<&str> = ["ping", "show", "help"].into_iter().collect();
        for cmd in get_commands() {
            let gated = cmd
                .required_permissions
                .contains(serenity::Permissions::ADMINISTRATOR);
            assert_eq!(
                gated,
                !open_to_all.contains(cmd.name.as_str()),
                "unexpected gating on {}",
                cmd.name
            );
        }
    }
}
