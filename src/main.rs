//! Application entry point.

use std::path::PathBuf;

use clap::Parser;
use hazel::engine::{AppConfig, Application};
use hazel::sandbox::Demo;
use log::{error, info};

#[derive(Debug, Parser)]
#[command(name = "sandbox", about = "Runs one of the Hazel engine demos")]
struct Args {
    /// Demo to run
    #[arg(value_enum, default_value_t = Demo::Sandbox)]
    demo: Demo,

    /// JSON file with window and debug UI settings
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default().with_title(args.demo.title()),
    };
    info!("Starting demo `{}`", args.demo.name());

    let mut app = Application::new(config);
    app.push_layer(args.demo.layer())?;
    if let Err(e) = app.run() {
        error!("Application error: {e}");
        return Err(Box::new(e));
    }

    Ok(())
}
