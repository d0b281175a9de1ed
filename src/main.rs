use std::error::Error;

use clap::Parser;
use quizmaker::{
    commands::{Cli, Command},
    config::Config,
    dispatch::App,
    runner::{run_once, run_shell},
};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let config = Config::from_env();

    tracing_log::LogTracer::init()?;
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    config.ensure_dirs()?;
    log::debug!("Using data directory {}", config.data_dir.display());

    let mut app = App::new(config, cli.database);
    match cli.command {
        Command::Shell => {
            if let Some(file) = &cli.file {
                if file.exists() {
                    app.session.open(file)?;
                } else {
                    app.session.set_file_path(file);
                }
            }
            run_shell(&mut app).await?;
        }
        command => {
            let message = run_once(&mut app, cli.file, command).await?;
            println!("{message}");
        }
    }

    Ok(())
}
