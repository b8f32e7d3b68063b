use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use property_api::app::{router, AppState};
use property_api::auth::issue_token;
use property_api::database::{DatabaseManager, MemoryPropertyStore, PgPropertyStore, PropertyStore};
use property_api::ingest::{CloudinaryConfig, CloudinaryStore, MemoryObjectStore, ObjectStore};
use property_api::services::PropertyService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreBackend {
    /// PostgreSQL via DATABASE_URL
    Postgres,
    /// Process memory; data is lost on exit
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ObjectBackend {
    /// Cloudinary via CLOUDINARY_* variables
    Cloudinary,
    /// Process memory; hands out memory:// URLs
    Memory,
}

#[derive(Parser, Debug)]
#[command(name = "property-api", version, about = "Property listings API server")]
struct Args {
    /// Listen port (falls back to PORT, then 3000)
    #[arg(long, env = "PROPERTY_API_PORT")]
    port: Option<u16>,

    /// Property store backend
    #[arg(long, value_enum, env = "PROPERTY_API_STORE", default_value_t = StoreBackend::Postgres)]
    store: StoreBackend,

    /// Image object store backend
    #[arg(long = "object-store", value_enum, env = "PROPERTY_API_OBJECT_STORE", default_value_t = ObjectBackend::Cloudinary)]
    object_store: ObjectBackend,

    /// Print a bearer token for this subject and exit (not in production)
    #[arg(long, value_name = "SUBJECT")]
    print_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, CLOUDINARY_*, JWT_SECRET
    let _ = dotenvy::dotenv();

    init_tracing();
    let args = Args::parse();

    // Initialize configuration (this loads the config singleton)
    let config = property_api::config::config();
    tracing::info!("Starting Property API in {:?} mode", config.environment);

    if config.security.jwt_secret.trim().is_empty() {
        bail!("SECURITY_JWT_SECRET (or JWT_SECRET) must be set outside development");
    }

    if let Some(subject) = args.print_token.as_deref() {
        if property_api::is_production!() {
            bail!("--print-token is not available in production");
        }
        let token = issue_token(subject, &config.security).context("failed to issue token")?;
        println!("{}", token);
        return Ok(());
    }

    let store: Arc<dyn PropertyStore> = match args.store {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::pool(&config.database)
                .await
                .context("failed to connect to the property database")?;
            let store = PgPropertyStore::new(pool);
            store.ensure_schema().await.context("failed to prepare the properties table")?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory property store; listings are not persisted");
            Arc::new(MemoryPropertyStore::new())
        }
    };

    let objects: Arc<dyn ObjectStore> = match args.object_store {
        ObjectBackend::Cloudinary => {
            let cloudinary = CloudinaryConfig::from_env().context("object store is not configured")?;
            Arc::new(CloudinaryStore::new(cloudinary))
        }
        ObjectBackend::Memory => Arc::new(MemoryObjectStore::new()),
    };

    let service = PropertyService::new(store, objects, config.pagination.clone(), &config.ingestion);
    let app = router(AppState::new(Arc::new(service), config));

    // Allow tests or deployments to override port via env
    let port = args
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()))
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Property API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if args.store == StoreBackend::Postgres {
        DatabaseManager::close().await;
    }
    tracing::info!("Property API stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("property_api=info,tower_http=info"));

    let json = match std::env::var("LOG_FORMAT") {
        Ok(format) => format.eq_ignore_ascii_case("json"),
        Err(_) => property_api::is_production!(),
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
