use anyhow::Result;
use clap::Parser;
use fluent_recorder::Config;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "fluent-recorder",
    about = "Voice response recorder for the Fluent Speaker course platform"
)]
struct Args {
    /// Path to a configuration file (extension optional)
    #[arg(short, long)]
    config: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let session = cfg.session_config();

    info!("Fluent Recorder v0.1.0");
    info!(
        "Max recording duration: {}s (auto-stop: {})",
        session.max_duration.as_secs(),
        session.auto_stop
    );
    info!("Format preference: {}", session.format_preferences.join(", "));
    info!("Recognition locale: {}", session.language);
    info!("Download directory: {}", cfg.download.dir);

    Ok(())
}
