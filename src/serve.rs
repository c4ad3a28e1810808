use std::path::PathBuf;

use anyhow::Context as _;
use axum::{
    extract::{FromRef, Request},
    http::{header, HeaderName, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    Router,
};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{log::LevelFilter, InfoLevel, Verbosity};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub use super::error::Error;
use super::{
    config::AppConfig,
    db::{self, establish_pool, Db},
    guard::AbuseGuard,
    models::KeywordAction,
    webhook::WebhookNotifier,
};

/// The application user agent. Concatenates the package name and version. e.g. `blogcomments/0.0.0`.
pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// The application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug, Clone)]
/// Command line arguments.
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "default.toml")]
    pub config: PathBuf,
    /// The verbosity level.
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
    /// Run a maintenance command instead of the server.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage the spam keyword list.
    #[command(subcommand)]
    Keywords(KeywordCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum KeywordCommand {
    /// Add a keyword, or change the action of an existing one.
    Add {
        keyword: String,
        #[arg(long, value_enum, default_value_t = KeywordActionArg::Flag)]
        action: KeywordActionArg,
    },
    /// Print every keyword and its action.
    List,
    /// Remove a keyword.
    Remove { keyword: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordActionArg {
    /// Store matching comments as spam.
    AutoReject,
    /// Keep matching comments pending and log the match.
    Flag,
}

impl From<KeywordActionArg> for KeywordAction {
    fn from(arg: KeywordActionArg) -> Self {
        match arg {
            KeywordActionArg::AutoReject => Self::AutoReject,
            KeywordActionArg::Flag => Self::Flag,
        }
    }
}

#[derive(Clone, FromRef)]
/// The application state, shared across all routes.
pub struct AppState {
    /// The application configuration.
    pub(crate) config: AppConfig,
    /// The database connection pool.
    pub db: Db,
    /// Rate limiting and spam classification.
    pub guard: AbuseGuard,
    /// Outbound CRM webhook delivery.
    pub notifier: WebhookNotifier,
}

impl AppState {
    pub fn new(config: AppConfig, db: Db) -> anyhow::Result<Self> {
        // Create a reqwest client that will be used for all outbound requests.
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.webhook_timeout())
            .build()
            .context("failed to build requester client")?;

        Ok(Self {
            guard: AbuseGuard::new(db.clone(), &config),
            notifier: WebhookNotifier::new(client, db.clone(), &config),
            db,
            config,
        })
    }
}

/// Preflights are answered with `204 No Content`.
async fn preflight_no_content(req: Request, next: Next) -> Response {
    let is_options = req.method() == Method::OPTIONS;
    let mut res = next.run(req).await;
    if is_options && res.status().is_success() {
        *res.status_mut() = StatusCode::NO_CONTENT;
    }
    res
}

/// Build the router with all layers applied.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-commenter-token"),
        ]);

    super::endpoints::routes()
        .layer(cors)
        .layer(middleware::from_fn(preflight_no_content))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[expect(clippy::print_stdout, reason = "keyword listing is command output")]
async fn keywords(db: &Db, command: KeywordCommand) -> anyhow::Result<()> {
    match command {
        KeywordCommand::Add { keyword, action } => {
            // Stored verbatim: surrounding spaces are part of the match.
            anyhow::ensure!(!keyword.trim().is_empty(), "keyword must not be empty");

            let action = KeywordAction::from(action);
            db::spam_keywords::upsert(db, &keyword, action).await?;
            info!("saved keyword {keyword:?} ({})", action.as_str());
        }
        KeywordCommand::List => {
            for kw in db::spam_keywords::list(db).await? {
                println!("{}\t{}", kw.action().as_str(), kw.keyword);
            }
        }
        KeywordCommand::Remove { keyword } => {
            if db::spam_keywords::remove(db, &keyword).await? {
                info!("removed keyword {keyword:?}");
            } else {
                warn!("keyword {keyword:?} not found");
            }
        }
    }

    Ok(())
}

/// The main application entry point.
pub async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    // Set up trace logging to console and account for the user-provided verbosity flag.
    if args.verbosity.log_level_filter() != LevelFilter::Off {
        let lvl = match args.verbosity.log_level_filter() {
            LevelFilter::Error => tracing::Level::ERROR,
            LevelFilter::Warn => tracing::Level::WARN,
            LevelFilter::Info | LevelFilter::Off => tracing::Level::INFO,
            LevelFilter::Debug => tracing::Level::DEBUG,
            LevelFilter::Trace => tracing::Level::TRACE,
        };
        tracing_subscriber::fmt().with_max_level(lvl).init();
    }

    if !args.config.exists() {
        // Not fatal: every setting can also come from the environment.
        warn!(
            "configuration file {} does not exist",
            args.config.display()
        );
    }

    let config = AppConfig::load(&args.config)?;

    let db = establish_pool(&config.db)
        .await
        .context("failed to establish database connection pool")?;

    if let Some(Command::Keywords(command)) = args.command {
        return keywords(&db, command).await;
    }

    // Initialize metrics reporting.
    super::metrics::setup(config.metrics.as_ref()).context("failed to set up metrics exporter")?;

    if config.webhook_url.is_none() {
        info!("no fallback webhook configured; only per-location webhooks will be used");
    }

    let addr = config.listen_address;
    let app = app(AppState::new(config, db)?);

    let listener = TcpListener::bind(&addr)
        .await
        .context("failed to bind address")?;

    info!("listening on {addr}");

    axum::serve(listener, app.into_make_service())
        .await
        .context("failed to serve app")
}
