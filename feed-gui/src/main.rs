mod app;
mod markup;

use std::sync::Arc;

use eframe::{egui, NativeOptions};
use feed_core::{AppConfig, FeedConfig, FeedLoader};
use reqwest::{redirect, ClientBuilder};
use tokio::runtime::Runtime;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::app::{AppInit, FeedApp};

fn main() -> eframe::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let runtime = Arc::new(Runtime::new().expect("failed to initialise Tokio runtime"));
    let client = ClientBuilder::new()
        .redirect(redirect::Policy::limited(config.feed.max_redirects))
        .user_agent(config.feed.user_agent.clone())
        .build()
        .expect("failed to build HTTP client");
    let endpoint = match config.feed.endpoint_url() {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "falling back to the default feed endpoint");
            FeedConfig::default()
                .endpoint_url()
                .expect("default feed endpoint is a valid URL")
        }
    };
    let loader = FeedLoader::new(client, endpoint);

    let init = AppInit {
        runtime,
        loader,
        config,
    };

    eframe::run_native(
        "FeedView",
        NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([1100.0, 800.0])
                .with_min_inner_size([420.0, 400.0]),
            ..Default::default()
        },
        Box::new(move |cc| Box::new(FeedApp::new(init, &cc.egui_ctx))),
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
