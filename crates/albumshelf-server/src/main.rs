use albumshelf_db::{entities::user::UserRole, AppState};
use albumshelf_server::{commands, router, ServerConfig};
use anyhow::Context;
use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Parser)]
#[command(name = "albumshelf-server")]
#[command(about = "Music catalog server and administration", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a user account
    CreateUser {
        /// Display name; for artists this is the name albums are matched against
        display_name: String,
        /// Defaults to the display name lowercased without spaces
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = commands::DEFAULT_ARTIST_PASSWORD)]
        password: String,
        /// artist, editor or viewer
        #[arg(long, default_value = "artist")]
        role: UserRole,
    },
    /// Deactivate an account; it can no longer log in or write
    DeactivateUser { username: String },
    /// Load sample users, albums and songs (idempotent)
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let db = open_database().await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db).await,
        Command::CreateUser {
            display_name,
            username,
            email,
            password,
            role,
        } => {
            let user =
                commands::create_user(&db, &display_name, username, email, &password, role)
                    .await
                    .context("could not create user")?;
            println!(
                "Created {} {} (username: {}, email: {})",
                user.role, user.display_name, user.username, user.email
            );
            Ok(())
        }
        Command::DeactivateUser { username } => {
            commands::deactivate_user(&db, &username)
                .await
                .with_context(|| format!("could not deactivate {username}"))?;
            println!("Deactivated {username}");
            Ok(())
        }
        Command::Seed => {
            let report = commands::seed(&db).await.context("seed failed")?;
            println!(
                "Seeded {} users, {} songs, {} albums",
                report.users, report.songs, report.albums
            );
            Ok(())
        }
    }
}

async fn open_database() -> anyhow::Result<DatabaseConnection> {
    let db_config = albumshelf_db::DatabaseConfig::from_env();
    tracing::info!("connecting to database...");
    let db = albumshelf_db::connect(&db_config)
        .await
        .context("failed to connect to database")?;

    tracing::info!("running database migrations...");
    albumshelf_migration::Migrator::up(&db, None)
        .await
        .context("failed to run migrations")?;
    tracing::info!("migrations complete");
    Ok(db)
}

fn jwt_secret() -> anyhow::Result<String> {
    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());
    if secret == DEFAULT_JWT_SECRET {
        tracing::warn!(
            "JWT_SECRET is set to a known default value! \
             Set JWT_SECRET to a strong random string (at least 32 chars) in production."
        );
        if std::env::var("ALBUMSHELF_ENV").unwrap_or_default() == "production" {
            anyhow::bail!("refusing to start: JWT_SECRET must be set to a secure value in production");
        }
    }
    Ok(secret)
}

async fn serve(db: DatabaseConnection) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        db,
        jwt_secret: jwt_secret()?,
    });
    let config = ServerConfig::from_env()?;
    let app = router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "server started");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")
}
