use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use operator_admin::config::Config;
use operator_admin::db::{self, AppState};
use operator_admin::models::{OperatorRole, normalize_user_name};
use operator_admin::services::OperatorService;

#[derive(Parser)]
#[command(name = "operator-admin", version, about = "Operator account administration")]
struct Cli {
    /// SQLite database file (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web interface (default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create an operator from the command line
    CreateOperator {
        user_name: String,
        #[arg(long, env = "OPERATOR_PASSWORD")]
        password: String,
        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "operator_admin=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    let pool = db::create_pool(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path))?;
    {
        let conn = pool.get()?;
        db::init_db(&conn)?;
    }

    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(pool, config).await
        }
        Command::CreateOperator {
            user_name,
            password,
            admin,
        } => {
            let role = if admin {
                OperatorRole::Admin
            } else {
                OperatorRole::Standard
            };
            let operators = OperatorService::new(pool, config.bcrypt_cost);
            let operator = operators
                .create(&normalize_user_name(&user_name), &password, role)
                .await?;
            tracing::info!(
                "Created operator {} ({}) with role {}",
                operator.user_name,
                operator.id,
                operator.role.as_ref()
            );
            Ok(())
        }
    }
}

async fn serve(pool: db::DbPool, config: Config) -> anyhow::Result<()> {
    let state = AppState::new(pool, &config)?;

    match &config.super_admin_password {
        Some(password) => {
            if state
                .operators
                .ensure_super_admin(&config.super_admin_username, password)
                .await
                .context("bootstrapping the super admin")?
            {
                tracing::info!("Bootstrapped super admin {}", config.super_admin_username);
            }
        }
        None => tracing::info!(
            "SUPER_ADMIN_PASSWORD not set, skipping super admin bootstrap"
        ),
    }

    if !config.auth_required {
        tracing::warn!("AUTH_REQUIRED is off, operator pages are open to anyone");
    }

    let app = operator_admin::app(state);
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
