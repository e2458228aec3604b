use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use api_ingress::{shutdown::wait_for_shutdown, ApiIngress, ApiIngressConfig};
use runtime::{AppConfig, AppConfigProvider, CliArgs};
use user_admin::config::UserAdminConfig;
use user_admin::UserAdmin;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Admin Console Server - administrative user management API
#[derive(Parser)]
#[command(name = "admin-server")]
#[command(about = "Admin Console Server - administrative user management API")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use in-memory stores seeded from `user_admin.mock_users`
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

/// Modules wired from configuration, ready to be served.
struct Modules {
    ingress: ApiIngress,
    user_admin: UserAdmin,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    // Apply CLI overrides (port / verbosity)
    config.apply_cli_overrides(&args);

    // Initialize logging
    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Admin Console Server starting");

    // Print config and exit if requested
    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    // Execute command
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

/// Build every module from its config section.
fn init_modules(config: &AppConfig, args: &CliArgs) -> Result<Modules> {
    let provider = AppConfigProvider::new(config.clone());

    let mut ingress_cfg: ApiIngressConfig = provider.module_config("api_ingress")?;
    if ingress_cfg.bind_addr.trim().is_empty() {
        ingress_cfg.bind_addr = config.bind_addr();
    }

    let users_cfg: UserAdminConfig = provider.module_config("user_admin")?;
    users_cfg
        .ensure_fits_request_timeout(Duration::from_secs(ingress_cfg.request_timeout_sec))
        .context("Invalid user_admin configuration")?;
    let user_admin = UserAdmin::new();
    user_admin
        .init(&users_cfg, args.mock)
        .context("Failed to initialize user_admin")?;

    Ok(Modules {
        ingress: ApiIngress::new(ingress_cfg),
        user_admin,
    })
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");
    let modules = init_modules(&config, &args)?;

    let routes = modules.user_admin.register_rest(axum::Router::new())?;
    let router = modules
        .ingress
        .build_router(routes, Some(modules.user_admin.openapi()));
    let listener = modules.ingress.bind().await?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown().await {
            tracing::error!("Signal handler failed: {e:#}");
        }
        trigger.cancel();
    });

    ApiIngress::serve(listener, router, cancel).await?;
    tracing::info!("Admin Console Server stopped");
    Ok(())
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    // Module sections must parse and wire up, without contacting any store.
    init_modules(&config, &args)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}
