//! Learning Gym CLI - track learning projects and quiz yourself on your documents.

use clap::Parser;
use gym_cli::commands;
use gym_cli::{Cli, Command, Config, Context, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> gym_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load or create config
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::path()?,
    };
    let config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        let cfg = Config::default();
        cfg.save_to(&config_path).ok();
        cfg
    };

    // Logs go to stderr so command output stays pipeable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.settings.log_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let ctx = Context::open(config)?;

    match cli.command {
        Command::Project(args) => commands::execute_project(args, &ctx, &formatter)?,
        Command::Milestone(args) => commands::execute_milestone(args, &ctx, &formatter)?,
        Command::Session(args) => commands::execute_session(args, &ctx, &formatter)?,
        Command::Document(args) => commands::execute_document(args, &ctx, &formatter)?,
        Command::Questions(args) => commands::execute_questions(args, &ctx, &formatter).await?,
    }

    Ok(())
}
