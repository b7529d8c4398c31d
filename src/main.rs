// Module declarations
mod app;
mod bus;
mod cli;
mod config;
mod format;
mod input;
mod listener;
mod logging;
mod refresh;
mod registry;
mod render;
mod sink;
mod terminal;
mod ui;

use clap::Parser;
use cli::Args;
use config::Config;
use terminal::{init_terminal, restore_terminal};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Parse command line arguments
    let args = Args::parse();

    // Determine config path for logging later
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config_existed = config_path.exists();

    // Load config first for logger initialization
    let mut config = Config::load(args.config.clone())?;

    // Command line switches win over the file
    args.apply_to(&mut config);

    // Initialize logger first
    if config.logging.enabled {
        crate::logging::ensure_log_directory()?;
        crate::logging::init_logger(&config.logging)?;
        crate::logging::log_startup_info();
        // Log config loading now that logger is initialized
        crate::logging::log_config_loading(&config_path, !config_existed);
    }

    // Initialize terminal
    let terminal = init_terminal()?;

    // Save logging state before app takes ownership
    let logging_enabled = config.logging.enabled;

    // Run application
    let result = app::run(config, terminal).await;

    // Log shutdown before restoring terminal
    if logging_enabled {
        crate::logging::log_shutdown_info();
    }

    // Restore terminal
    restore_terminal()?;
    result
}
