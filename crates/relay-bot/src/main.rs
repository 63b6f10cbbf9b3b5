use std::sync::Arc;

use tracing::{error, info};

use relay_agent::{AgentRuntime, OpenAiProvider};
use relay_core::RelayConfig;
use relay_memory::HistoryStore;
use relay_telegram::TelegramAdapter;

mod app;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_SHA: &str = env!("RELAY_GIT_SHA");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "relay_bot=info,relay_telegram=info,relay_agent=info,relay_memory=info".into()
            }),
        )
        .init();

    info!(version = VERSION, git_sha = GIT_SHA, "relay-bot starting");

    // A bot without credentials can do nothing useful, so refuse to start.
    let config = match RelayConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!(code = e.code(), "{e}");
            return Err(e.into());
        }
    };

    let provider = OpenAiProvider::new(&config.openai, config.proxy.as_ref())?;
    if let Some(proxy) = &config.proxy {
        info!(address = %proxy.address, "completion requests go through proxy");
    }
    let agent = AgentRuntime::new(Box::new(provider), config.openai.model.clone());
    let history = HistoryStore::from_config(&config.history);
    info!(
        provider = agent.provider().name(),
        model = agent.model(),
        max_turns = history.max_turns(),
        "agent ready"
    );

    let state = Arc::new(app::AppState::new(agent, history));
    TelegramAdapter::new(&config.telegram, state).run().await?;

    info!("relay-bot stopped");
    Ok(())
}
