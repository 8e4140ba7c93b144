mod app;
mod cli;
mod commands;
mod config;
mod core;
mod display;
mod extract;
mod gateway;
mod gis;
mod input;
mod map;
mod providers;
mod session;
mod utils;

use crate::app::Application;
use crate::cli::Args;
use crate::commands::create_command_router;
use crate::config::{ChatBackendKind, Config, Provider};
use crate::core::error::GeoChatError;
use crate::gateway::{ChatBackend, ToolGateway};
use crate::gis::HttpGisBackend;
use crate::map::OsmLinkRenderer;
use crate::providers::chat::{LlmChatBackend, UnconfiguredChatBackend};
use crate::providers::factory::ProviderFactory;
use crate::session::{ChatSession, LoadingIndicator};
use clap::Parser;
use console::Term;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,geochat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        display::display_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> Result<(), GeoChatError> {
    let args = Args::parse();
    let config = Config::load()?;

    let gis = Arc::new(HttpGisBackend::new(config.gis_url(args.gis_url.as_deref())));
    tracing::info!(gis_url = gis.base_url(), "using GIS server");

    let chat: Arc<dyn ChatBackend> = match config.chat_backend {
        ChatBackendKind::GisServer => gis.clone() as Arc<dyn ChatBackend>,
        ChatBackendKind::Provider => {
            let provider = resolve_provider(&args, &config)?;
            match build_chat_provider(provider, &args, &config) {
                Ok(chat) => chat,
                Err(GeoChatError::Config(reason)) => {
                    tracing::warn!(%reason, "chat provider unavailable, only slash commands will work");
                    Arc::new(UnconfiguredChatBackend::new(reason)) as Arc<dyn ChatBackend>
                }
                Err(e) => return Err(e),
            }
        }
    };

    // Cursor movement only erases the line on a real terminal
    let indicator = if Term::stdout().is_term() {
        LoadingIndicator::with_listener(|active| {
            if active {
                display::show_loading();
            } else {
                display::clear_loading();
            }
        })
    } else {
        LoadingIndicator::new()
    };

    let session = ChatSession::new(
        create_command_router(),
        Arc::new(ToolGateway::new(chat, gis)),
        Arc::new(OsmLinkRenderer),
        indicator,
        config.map.zoom,
    );

    let mut app = Application::new(args, session);
    app.run().await
}

fn resolve_provider(args: &Args, config: &Config) -> Result<Provider, GeoChatError> {
    match args.provider.as_deref() {
        Some(name) => Provider::from_str(name)
            .ok_or_else(|| GeoChatError::Config(format!("Unsupported provider: {}", name))),
        None => Ok(config.active_provider.unwrap_or_default()),
    }
}

fn build_chat_provider(
    provider: Provider,
    args: &Args,
    config: &Config,
) -> Result<Arc<dyn ChatBackend>, GeoChatError> {
    let mut provider_config = config.provider_config(provider);
    if let Some(model) = &args.model {
        provider_config.model = Some(model.clone());
    }

    let llm = ProviderFactory::new().create(&provider, &provider_config)?;
    tracing::info!(?provider, model = llm.model(), "chat provider ready");
    Ok(Arc::new(LlmChatBackend::new(llm)))
}
