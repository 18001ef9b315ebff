use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use prepspace_client::api::HttpApi;
use prepspace_client::config::Config;
use prepspace_client::router::{MemoryNavigator, Navigator};
use prepspace_client::storage::FileHintStore;
use prepspace_client::{App, FetchOutcome, StartMode};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={level},prepspace_client={level}",
                env!("CARGO_PKG_NAME"),
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PrepSpace client v{}", env!("CARGO_PKG_VERSION"));

    let api = Arc::new(HttpApi::new(
        &config.api_base_url,
        config.request_timeout,
        config.session_cookie.as_deref(),
    )?);
    info!("Backend: {}", config.api_base_url);

    let storage = Arc::new(FileHintStore::open(&config.hint_store_path));
    let navigator = Arc::new(MemoryNavigator::new(&config.start_path));

    let app = App::new(api, storage, navigator.clone());
    let mode = if config.guest_mode {
        StartMode::Guest
    } else {
        StartMode::Session
    };

    let (session, outcome) = app.start(mode).await;

    match session.user() {
        Some(user) if session.is_guest() => info!("Browsing as {}", user.name),
        Some(user) => info!("Signed in as {} ({})", user.name, user.id),
        None => info!("Not signed in"),
    }

    match outcome {
        FetchOutcome::Failed | FetchOutcome::FailedToGuest => {
            warn!("Could not load spaces; retry once the backend is reachable")
        }
        FetchOutcome::Empty => info!("No spaces yet"),
        FetchOutcome::SkippedLoginRoute => info!("On the login screen, spaces not loaded"),
        _ => {}
    }

    let state = app.directory.snapshot();
    for space in &state.spaces {
        let marker = if state.current_id == Some(space.id) { "*" } else { " " };
        println!(
            "{marker} {:>6}  {:?}  {} ({} members)",
            space.id,
            space.space_type,
            space.name,
            space.members.len()
        );
    }
    println!("location: {}", navigator.current_path());

    Ok(())
}
