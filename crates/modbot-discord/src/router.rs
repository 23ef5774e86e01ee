use std::sync::{Arc, OnceLock};

use serenity::{
    all::{
        ActivityData, Context, EventHandler, GatewayIntents, GuildId, Member, Message, Ready,
        User,
    },
    async_trait, Client,
};

use modbot_core::{
    config::Config, dispatch::Dispatcher, messaging::port::GatewayPort, store::ConfigStore,
};

use crate::handlers;
use crate::DiscordGateway;

pub struct AppState {
    pub cfg: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
}

// Filled once the client exists so the port can share the client's Http.
struct Handler {
    state: Arc<OnceLock<AppState>>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!("{} has logged in", ready.user.name);
        if let Some(state) = self.state.get() {
            ctx.set_activity(Some(presence(&state.cfg)));
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        if let Some(state) = self.state.get() {
            handlers::handle_message(msg, state).await;
        }
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        if let Some(state) = self.state.get() {
            handlers::handle_member_join(new_member, state).await;
        }
    }

    async fn guild_member_removal(
        &self,
        _ctx: Context,
        guild_id: GuildId,
        user: User,
        _member_data_if_available: Option<Member>,
    ) {
        if let Some(state) = self.state.get() {
            handlers::handle_member_leave(guild_id, user, state).await;
        }
    }
}

fn presence(cfg: &Config) -> ActivityData {
    let Some(url) = cfg.status_url.as_deref() else {
        return ActivityData::playing(cfg.status_text.clone());
    };
    match ActivityData::streaming(cfg.status_text.clone(), url) {
        Ok(activity) => activity,
        Err(e) => {
            tracing::warn!("invalid BOT_STATUS_URL {url}: {e}");
            ActivityData::playing(cfg.status_text.clone())
        }
    }
}

/// Connect to the Discord gateway and dispatch events until the client stops.
pub async fn run_gateway(cfg: Arc<Config>, store: Arc<ConfigStore>) -> anyhow::Result<()> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let slot = Arc::new(OnceLock::new());
    let mut client = Client::builder(&cfg.discord_token, intents)
        .event_handler(Handler {
            state: slot.clone(),
        })
        .await?;

    let gateway: Arc<dyn GatewayPort> = Arc::new(DiscordGateway::new(client.http.clone()));
    let dispatcher = Arc::new(Dispatcher::build(&cfg, store, gateway));
    if slot.set(AppState { cfg, dispatcher }).is_err() {
        anyhow::bail!("gateway state initialised twice");
    }

    tracing::info!("connecting to discord");
    client.start().await?;

    Ok(())
}
