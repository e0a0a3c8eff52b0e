use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use clap::{Parser, Subcommand, ValueEnum};
use freelance_pay::config::{GatewayConfig, ServerConfig};
use freelance_pay::domain::ports::{CheckoutStoreRef, LedgerStoreRef, UserStoreRef};
use freelance_pay::infrastructure::correlation_cache::CorrelationCache;
use freelance_pay::infrastructure::in_memory::{
    InMemoryCheckoutStore, InMemoryLedgerStore, InMemoryUserStore,
};
use freelance_pay::infrastructure::mpesa::MpesaClient;
#[cfg(feature = "storage-rocksdb")]
use freelance_pay::infrastructure::rocksdb::RocksDBStore;
use freelance_pay::interfaces::csv::user_reader::UserReader;
use freelance_pay::interfaces::http::{self, HttpState, HttpStatePorts};
use miette::{IntoDiagnostic, Result, miette};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, env = "LOG_FORMAT", default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the payment and wallet API.
    Serve {
        #[command(flatten)]
        server: ServerConfig,

        #[command(flatten)]
        gateway: GatewayConfig,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

struct Stores {
    users: UserStoreRef,
    ledger: LedgerStoreRef,
    checkouts: CheckoutStoreRef,
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| miette!("failed to initialise logging: {}", e))
}

fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = RocksDBStore::open(path).into_diagnostic()?;
            info!(path = %path.display(), "using RocksDB storage");
            Ok(Stores {
                users: Arc::new(store.clone()),
                ledger: Arc::new(store.clone()),
                checkouts: Arc::new(store),
            })
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => Err(miette!(
            "--db-path requires building with the storage-rocksdb feature"
        )),
        None => {
            info!("using in-memory storage");
            Ok(Stores {
                users: Arc::new(InMemoryUserStore::new()),
                ledger: Arc::new(InMemoryLedgerStore::new()),
                checkouts: Arc::new(InMemoryCheckoutStore::new()),
            })
        }
    }
}

async fn seed_users(path: &Path, users: &UserStoreRef) -> Result<usize> {
    let file = File::open(path).into_diagnostic()?;
    let mut loaded = 0;
    for row in UserReader::new(file).users() {
        match row {
            Ok(user) => {
                users.store(user).await.into_diagnostic()?;
                loaded += 1;
            }
            Err(e) => warn!(error = %e, "skipping malformed user row"),
        }
    }
    Ok(loaded)
}

async fn serve(server: ServerConfig, gateway: GatewayConfig) -> Result<()> {
    let stores = open_stores(server.db_path.as_deref())?;
    if let Some(path) = &server.users {
        let loaded = seed_users(path, &stores.users).await?;
        info!(loaded, path = %path.display(), "accounts loaded");
    }

    info!(config = ?gateway, "configuring payment gateway");
    let client = MpesaClient::new(gateway).into_diagnostic()?;
    let cache = CorrelationCache::new(Duration::from_secs(server.checkout_ttl_secs));
    let state = web::Data::new(HttpState::new(
        HttpStatePorts {
            users: stores.users,
            ledger: stores.ledger,
            checkouts: stores.checkouts,
            gateway: Arc::new(client),
        },
        cache,
        server.callback_allowlist,
    ));

    info!(bind = %server.bind, "starting server");
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(from_fn(http::trace::log_request))
            .configure(http::configure)
    })
    .bind(server.bind.as_str())
    .into_diagnostic()?
    .run()
    .await
    .into_diagnostic()
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match cli.command {
        Command::Serve { server, gateway } => serve(server, gateway).await,
    }
}
