mod app;
mod commands;
mod config;
mod prompt;
mod reporter;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shop_admin::AdminError;
use shop_admin_store::{SettingsStore, ViewMode};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::app::{App, open_settings};
use crate::commands::github::GithubAction;
use crate::commands::image::ImageAction;
use crate::commands::products::ProductsAction;
use crate::commands::reviews::ReviewsAction;
use crate::config::AppConfig;
use crate::reporter::Reporter;

const LOG_ENV: &str = "SHOP_ADMIN_LOG";

#[derive(Parser)]
#[command(name = "shop-admin")]
#[command(version, about = "Manage the shop catalog, reviews and product images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in as an operator
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the saved session
    Logout,
    /// Manage catalog products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage customer reviews
    Reviews {
        #[command(subcommand)]
        action: ReviewsAction,
    },
    /// Upload product images
    Image {
        #[command(subcommand)]
        action: ImageAction,
    },
    /// Manage credentials for the image repository
    Github {
        #[command(subcommand)]
        action: GithubAction,
    },
    /// Set the default product view
    View { mode: ViewMode },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config();
    let settings = open_settings()?;

    match cli.command {
        Command::Login { email } => commands::session::login(&config, &settings, email).await,
        Command::Logout => commands::session::logout(&settings),
        Command::Github { action } => commands::github::run(settings, action).await,
        Command::View { mode } => {
            settings.set_view_mode(mode)?;
            println!("Product view set to {mode}");
            Ok(())
        }
        Command::Products { action } => {
            run_connected(config, settings, Connected::Products(action)).await
        }
        Command::Reviews { action } => {
            run_connected(config, settings, Connected::Reviews(action)).await
        }
        Command::Image { action } => {
            run_connected(config, settings, Connected::Image(action)).await
        }
    }
}

/// Commands that talk to the document store.
enum Connected {
    Products(ProductsAction),
    Reviews(ReviewsAction),
    Image(ImageAction),
}

async fn run_connected(
    config: AppConfig,
    settings: Arc<SettingsStore>,
    command: Connected,
) -> Result<()> {
    let app = App::connect(config, settings).await?;
    let reporter = Reporter::spawn(app.ctx.subscribe());

    let result = match command {
        Connected::Products(action) => commands::products::run(&app, action).await,
        Connected::Reviews(action) => commands::reviews::run(&app, action).await,
        Connected::Image(action) => commands::image::run(&app, action).await,
    };

    // Closing the event stream lets the reporter flush and exit.
    drop(app);
    reporter.finish().await;
    result
}

/// Errors the core already reported as a notice.
fn already_reported(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<AdminError>(),
        Some(
            AdminError::Remote(_)
                | AdminError::InvalidImport(_)
                | AdminError::Undecodable(_)
                | AdminError::FileHost(_)
                | AdminError::NoCredentials
        )
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !already_reported(&e) {
                eprintln!("error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
