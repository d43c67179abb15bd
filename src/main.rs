mod assembler;
mod channel_map;
mod config;
mod constants;
mod cursor;
mod decoder;
mod error;
mod fragment;
mod fragment_file;
mod header;
mod process;
mod processor;
mod sample;
mod stream;

use std::path::PathBuf;

use log::{error, info};

use crate::config::Config;
use crate::process::process_run;

fn main() {
    //Setup logging
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .unwrap();

    info!("Starting up rusted latome...\n");

    let config_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from("config.yaml"),
    };

    let config = match Config::read_config_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Config error at startup: {} Shutting down.\n", e);
            return;
        }
    };

    match process_run(config) {
        Ok(_) => info!("Decoding successfully completed.\n"),
        Err(e) => error!("Decoding ran into an error: {} Shutting down.\n", e),
    }
}
