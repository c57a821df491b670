pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod domain;
pub mod models;
pub mod parser;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{AllowCommands, Cli, Commands};
pub use config::Config;
use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config)?;

    if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let mut builder = PrometheusBuilder::new();
        if let Some(port) = config.observability.metrics_port {
            builder = builder.with_http_listener(([0, 0, 0, 0], port));
        }
        builder
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Prometheus metrics exporter initialized");
    }

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Init => cli::cmd_init(),

        Commands::Allow { command } => match command {
            AllowCommands::Add { id } => cli::cmd_allow_add(&config, &id).await,
            AllowCommands::Remove { id } => cli::cmd_allow_remove(&config, &id).await,
            AllowCommands::List => cli::cmd_allow_list(&config).await,
        },

        Commands::Search { query, page } => {
            let state = SharedState::new(config).await?;
            cli::cmd_search(&state, &query.join(" "), page).await
        }

        Commands::Page { cursor } => {
            let state = SharedState::new(config).await?;
            cli::cmd_page(&state, &cursor).await
        }

        Commands::Chat { user } => {
            info!("gifbot v{} starting", env!("CARGO_PKG_VERSION"));
            let state = SharedState::new(config).await?;
            cli::cmd_chat(&state, &user).await
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}
