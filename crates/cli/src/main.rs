mod config_commands;

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use {
    botplus_bot::{Bot, MentionReply},
    botplus_bridge::BRIDGE_MODULE,
    botplus_channels::MemoryTransport,
    botplus_common::UserId,
    botplus_config::BotplusConfig,
    botplus_modules::{ModuleOptions, ModuleStatus},
    botplus_poster::{POSTER_MODULE, StatsSource},
    clap::{Parser, Subcommand},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "botplus", about = "botplus, interaction waits and vote bridge for chat bots")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "BOTPLUS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the vote bridge and configured modules (default).
    Serve {
        /// Address to bind the bridge to (overrides config value).
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides config value).
        #[arg(long)]
        port: Option<u16>,
        /// Server count reported by the stats poster.
        #[arg(long, default_value_t = 0)]
        server_count: u64,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Show the status each module would register with.
    Modules,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Registration flags for `name`. A feature switched off in its own section
/// registers disabled.
fn module_options(config: &BotplusConfig, name: &str, feature_enabled: bool) -> ModuleOptions {
    let flags = config.module(name);
    ModuleOptions {
        disabled: flags.disabled || !feature_enabled,
        beta: flags.beta,
    }
}

/// Status of every known or configured module, without starting anything.
fn planned_status(config: &BotplusConfig) -> BTreeMap<String, ModuleStatus> {
    let mut out: BTreeMap<String, ModuleStatus> = config
        .modules
        .iter()
        .map(|(name, flags)| (name.clone(), ModuleStatus::new(!flags.disabled, flags.beta)))
        .collect();
    for (name, enabled) in [
        (BRIDGE_MODULE, config.bridge.enabled),
        (POSTER_MODULE, config.poster.enabled),
    ] {
        let options = module_options(config, name, enabled);
        out.insert(name.into(), ModuleStatus::new(!options.disabled, options.beta));
    }
    out
}

async fn serve(
    mut config: BotplusConfig,
    bind: Option<String>,
    port: Option<u16>,
    server_count: u64,
) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.bridge.host = bind;
    }
    if let Some(port) = port {
        config.bridge.port = port;
    }

    // No chat connection in bridge-only mode.
    let transport = Arc::new(MemoryTransport::new(UserId(0)));
    let (bot, dispatch_loop) = Bot::new(transport, config.bot.clone());
    let cancel = CancellationToken::new();
    let dispatch = tokio::spawn(dispatch_loop.run(cancel.clone()));

    if config.bot.mention_reply {
        bot.activate_mention_reply(MentionReply::Prefix).await;
    }

    let options = module_options(&config, BRIDGE_MODULE, config.bridge.enabled);
    let (bridge, status) = bot.activate_bridge(&config.bridge, options).await?;
    if status.is_enabled() {
        if let Some(addr) = bridge.local_addr() {
            info!(%addr, %status, "vote bridge listening");
        }
    } else {
        info!(%status, "vote bridge not started");
    }

    if config.poster.enabled {
        let options = module_options(&config, POSTER_MODULE, true);
        let source: Arc<dyn StatsSource> = Arc::new(move || server_count);
        match bot.activate_poster(&config.poster, source, options).await {
            Ok(status) => info!(%status, "stats poster registered"),
            Err(e) => warn!(error = %e, "stats poster not registered"),
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    bot.shutdown().await;
    cancel.cancel();
    dispatch.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "botplus starting");

    match cli.command {
        None => {
            let (config, _) = config_commands::load(cli.config.as_deref())?;
            serve(config, None, None, 0).await
        },
        Some(Commands::Serve {
            bind,
            port,
            server_count,
        }) => {
            let (config, _) = config_commands::load(cli.config.as_deref())?;
            serve(config, bind, port, server_count).await
        },
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, cli.config.as_deref())
        },
        Some(Commands::Modules) => {
            let (config, _) = config_commands::load(cli.config.as_deref())?;
            for (name, status) in planned_status(&config) {
                println!("  {name:<20} {status}");
            }
            Ok(())
        },
    }
}
