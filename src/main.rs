use std::sync::Arc;

use anyhow::{anyhow, Result};
use eframe::egui::ViewportBuilder;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hn_search::{Config, FetchController, HackerNewsClient, LifetimeToken};

mod app;

use crate::app::SearchApp;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hn_search=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::from_env()?;
    info!(
        base_url = %config.base_url,
        default_query = %config.default_query,
        hits_per_page = config.hits_per_page,
        "Starting HN Search"
    );

    let client = HackerNewsClient::new(&config)?;
    let mut controller = FetchController::new(Arc::new(client), &config.default_query, LifetimeToken::new());
    controller.start();

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("HN Search"),
        ..Default::default()
    };

    // The controller is dropped with the app, which cancels its token
    eframe::run_native(
        "HN Search",
        options,
        Box::new(move |_cc| Ok(Box::new(SearchApp::new(controller)))),
    )
    .map_err(|e| anyhow!("Failed to run window: {e}"))?;

    Ok(())
}
