// Control registry: maps a component/modal custom id to its handler
// Built once at startup and stored in `Data`.

use std::collections::HashMap;

use futures::future::BoxFuture;
use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};

use super::{dashboard, tickets};
use crate::utils::discord::{ephemeral, split_custom_id};
use crate::{Data, Error};

pub type ComponentHandler = for<'a> fn(
    &'a serenity::Context,
    &'a serenity::ComponentInteraction,
    &'a Data,
) -> BoxFuture<'a, Result<(), Error>>;

pub type ModalHandler = for<'a> fn(
    &'a serenity::Context,
    &'a serenity::ModalInteraction,
    &'a Data,
) -> BoxFuture<'a, Result<(), Error>>;

const GENERIC_FAILURE: &str = "❌ Something went wrong. Please try again.";

#[derive(Default)]
pub struct ControlRegistry {
    components: HashMap<&'static str, ComponentHandler>,
    modals: HashMap<&'static str, ModalHandler>,
}

impl ControlRegistry {
    /// Every control the bot renders
    pub fn build() -> Self {
        Self::default()
            .component(tickets::OPEN_TICKET, |ctx, i, data| {
                Box::pin(tickets::handle_open(ctx, i, data))
            })
            .component(tickets::TYPE_SELECT, |ctx, i, data| {
                Box::pin(tickets::handle_type_select(ctx, i, data))
            })
            .component(tickets::CLOSE_TICKET, |ctx, i, data| {
                Box::pin(tickets::handle_close(ctx, i, data))
            })
            .component(tickets::CLOSE_CONFIRM, |ctx, i, data| {
                Box::pin(tickets::handle_close_confirm(ctx, i, data))
            })
            .component(tickets::CLOSE_CANCEL, |ctx, i, data| {
                Box::pin(tickets::handle_close_cancel(ctx, i, data))
            })
            .component(dashboard::EDIT, |ctx, i, data| {
                Box::pin(dashboard::handle_button(ctx, i, data))
            })
            .modal(tickets::TICKET_FORM, |ctx, m, data| {
                Box::pin(tickets::handle_form(ctx, m, data))
            })
            .modal(dashboard::FORM, |ctx, m, data| {
                Box::pin(dashboard::handle_form(ctx, m, data))
            })
    }

    pub fn component(mut self, name: &'static str, handler: ComponentHandler) -> Self {
        self.components.insert(name, handler);
        self
    }

    pub fn modal(mut self, name: &'static str, handler: ModalHandler) -> Self {
        self.modals.insert(name, handler);
        self
    }

    /// Handler for a component custom id (`name` or `name:arg`)
    pub fn component_handler(&self, custom_id: &str) -> Option<ComponentHandler> {
        self.components.get(split_custom_id(custom_id).0).copied()
    }

    /// Handler for a modal custom id (`name` or `name:arg`)
    pub fn modal_handler(&self, custom_id: &str) -> Option<ModalHandler> {
        self.modals.get(split_custom_id(custom_id).0).copied()
    }
}

/// Generic failure notice for interactions that were already answered
fn failure_followup() -> serenity::CreateInteractionResponseFollowup {
    serenity::CreateInteractionResponseFollowup::new()
        .content(GENERIC_FAILURE)
        .ephemeral(true)
}

/// Route one interaction; handler errors end with a generic notice to the user
pub async fn dispatch(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &Data,
) {
    match interaction {
        serenity::Interaction::Component(component) => {
            let custom_id = &component.data.custom_id;
            let Some(handler) = data.controls.component_handler(custom_id) else {
                debug!("No handler for component {}", custom_id);
                return;
            };
            if let Err(e) = handler(ctx, component, data).await {
                error!("Component {} failed: {:?}", custom_id, e);
                // The handler may already have answered; then only a followup gets through
                if let Err(first) = component
                    .create_response(&ctx.http, ephemeral(GENERIC_FAILURE))
                    .await
                {
                    debug!("Failure notice for {} not sent as response: {:?}", custom_id, first);
                    if let Err(e) = component.create_followup(&ctx.http, failure_followup()).await {
                        warn!("Could not tell user about failed {}: {:?}", custom_id, e);
                    }
                }
            }
        }
        serenity::Interaction::Modal(modal) => {
            let custom_id = &modal.data.custom_id;
            let Some(handler) = data.controls.modal_handler(custom_id) else {
                debug!("No handler for modal {}", custom_id);
                return;
            };
            if let Err(e) = handler(ctx, modal, data).await {
                error!("Modal {} failed: {:?}", custom_id, e);
                if let Err(first) = modal
                    .create_response(&ctx.http, ephemeral(GENERIC_FAILURE))
                    .await
                {
                    debug!("Failure notice for {} not sent as response: {:?}", custom_id, first);
                    if let Err(e) = modal.create_followup(&ctx.http, failure_followup()).await {
                        warn!("Could not tell user about failed {}: {:?}", custom_id, e);
                    }
                }
            }
        }
        _ => {}
    }
}

/// poise event hook
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "{} is now online! In {} servers",
                data_about_bot.user.name,
                data_about_bot.guilds.len()
            );
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            dispatch(ctx, interaction, data).await;
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_rendered_control_is_routed() {
        let registry = ControlRegistry::build();

        for id in [
            "open_ticket",
            "ticket_type",
            "close_ticket",
            "close_confirm:1700000000",
            "close_cancel:1700000000",
            "dashboard:title",
            "dashboard:refresh",
        ] {
            assert!(registry.component_handler(id).is_some(), "no component handler for {}", id);
        }

        for id in ["ticket_form:general", "ticket_form:billing", "dashboard_form:color"] {
            assert!(registry.modal_handler(id).is_some(), "no modal handler for {}", id);
        }
    }

    #[test]
    fn test_unknown_controls() {
        let registry = ControlRegistry::build();
        assert!(registry.component_handler("music_pause").is_none());
        assert!(registry.component_handler("ticket_form:general").is_none());
        assert!(registry.modal_handler("open_ticket").is_none());
    }

    #[test]
    fn test_failure_followup_is_private() {
        let json = serde_json::to_value(failure_followup()).unwrap();
        assert_eq!(json["content"], GENERIC_FAILURE);
        assert!(!json["flags"].is_null());
    }
}
