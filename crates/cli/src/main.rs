mod check_commands;
mod prompt;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    clipcast_config::ClipcastConfig,
    clipcast_pipeline::{Job, Pipeline},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "clipcast", about = "clipcast: send a video from a link to a WhatsApp chat")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./clipcast.toml and ~/.config/clipcast/).
    #[arg(long, global = true, env = "CLIPCAST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask for a link, phone number and caption, then send (default).
    Prompt,
    /// Send one video without prompting.
    Send {
        /// Video page URL.
        #[arg(long)]
        url: String,
        /// Recipient phone number, international format, digits only.
        #[arg(long)]
        to: String,
        #[arg(long)]
        caption: Option<String>,
    },
    /// Serve the web form.
    Serve {
        /// Address to bind to (overrides config value).
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides config value).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Validate configuration and look for yt-dlp.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so prompts and results on stdout stay readable.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Gateway credentials are checked here, before any job can start.
fn build_pipeline(config: &ClipcastConfig) -> anyhow::Result<Arc<Pipeline>> {
    let pipeline = Pipeline::from_config(config)
        .context("gateway is not configured (run `clipcast check` for details)")?;
    Ok(Arc::new(pipeline))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "clipcast starting");

    let config = clipcast_config::load_from(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Prompt) {
        Commands::Prompt => {
            let pipeline = build_pipeline(&config)?;
            let stdin = std::io::stdin();
            let outcome = prompt::run_prompt(&pipeline, stdin.lock(), std::io::stdout()).await?;
            if !outcome.is_success() {
                std::process::exit(1);
            }
            Ok(())
        },
        Commands::Send { url, to, caption } => {
            let pipeline = build_pipeline(&config)?;
            let outcome = pipeline.run(Job::new(url, to, caption)).await;
            println!("{}", outcome.message());
            if !outcome.is_success() {
                std::process::exit(1);
            }
            Ok(())
        },
        Commands::Serve { bind, port } => {
            let pipeline = build_pipeline(&config)?;
            // CLI args override config values
            let bind = bind.unwrap_or(config.server.bind);
            let port = port.unwrap_or(config.server.port);
            let addr = clipcast_web::listen_addr(&bind, port)?;
            clipcast_web::serve(addr, pipeline).await?;
            Ok(())
        },
        Commands::Check => check_commands::handle_check(&config, cli.config.as_deref()).await,
    }
}
