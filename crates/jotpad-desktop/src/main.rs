//! Jotpad Desktop Application
//!
//! A small synced notepad: note list, editor with markdown preview, and a
//! layout that collapses to a single pane on narrow windows.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod components;
mod state;
mod theme;
mod views;

use dioxus::desktop::{Config, WindowBuilder};
use jotpad_core::config::ClientConfig;

fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jotpad=debug".parse().expect("valid directive")),
        )
        .init();

    tracing::info!("Starting Jotpad...");

    let client_config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration, falling back to defaults: {}", e);
            ClientConfig::default()
        }
    };
    tracing::info!(
        "Edit policy: {}, markdown preview: {}",
        client_config.edit_policy,
        client_config.markdown_preview
    );

    let window = WindowBuilder::new()
        .with_title("Jotpad")
        .with_min_inner_size(dioxus::desktop::tao::dpi::LogicalSize::new(320.0, 480.0));

    dioxus::LaunchBuilder::new()
        .with_cfg(Config::new().with_window(window))
        .with_context(client_config)
        .launch(app::App);
}
