mod app;
mod directory;
mod event;
mod responder;
mod session;
mod theme;

use app::UniversumApp;
use directory::{Character, CharacterDirectory};
use eframe::egui;
use responder::{ReplyConfig, ReplyScheduler};
use session::ChatController;
use std::sync::mpsc;

// The character directory is a fixed seed set; the app never writes to it.
const SEED_CHARACTERS: &str = include_str!("characters.json");

fn load_seed_directory() -> Result<CharacterDirectory, Box<dyn std::error::Error>> {
    let characters: Vec<Character> = serde_json::from_str(SEED_CHARACTERS)?;
    Ok(CharacterDirectory::new(characters)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let directory = load_seed_directory()?;
    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("universum-runtime")
        .build()?;

    let scheduler = ReplyScheduler::new(runtime.handle().clone(), tx, ReplyConfig::default());
    let app = UniversumApp::new(rx, scheduler, ChatController::new(directory));
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Universum",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
