//! XML Metadata Editor
//!
//! Edit a table of tag/value/attribute rows, preview and export it as XML,
//! and keep named documents in a remote store.

mod app;
mod core;
mod orchestrator;
mod remote;
mod ui;

use app::MetadataEditorApp;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    tracing::info!("Starting XML Metadata Editor...");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1180.0, 780.0])
            .with_min_inner_size([720.0, 480.0])
            .with_title("XML Metadata Editor"),
        ..Default::default()
    };

    eframe::run_native(
        "XML Metadata Editor",
        native_options,
        Box::new(|cc| Ok(Box::new(MetadataEditorApp::new(cc)))),
    )
}
