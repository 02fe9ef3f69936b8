//! # Kuwaiba Server
//!
//! The network inventory web service: `Axum` routes over the snapshot-backed inventory
//! database, with every feature slice wired through a type-safe event bus.
//!
//! ## Example
//! ```no_run
//! use kw_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(4583)
//!         .build()
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

mod router;

use anyhow::{Context, Result};
use axum_server::Handle;
use kuwaiba::domain::config::ApiConfig;
use kuwaiba::features::audit::Audit;
use kuwaiba::kernel::server::ApiState;
use kw_database::Database;
use kw_event_bus::EventBus;
use kw_storage::{Compression, Storage};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Root of the snapshot and the attachment files.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cfg.storage.data_dir = dir.into();
        self
    }

    async fn init_storage(&self) -> Result<Storage> {
        let storage_cfg = &self.cfg.storage;
        let compression = if storage_cfg.compression { Compression::Lz4 } else { Compression::None };
        Storage::builder()
            .root(&storage_cfg.data_dir)
            .compression(compression)
            .connect()
            .await
            .with_context(|| format!("Failed to open storage at {}", storage_cfg.data_dir.display()))
    }

    async fn init_database(&self, storage: Storage) -> Result<Database> {
        Database::builder()
            .storage(storage)
            .snapshot(&self.cfg.database.snapshot)
            .open()
            .await
            .context("Failed to load the inventory snapshot")
    }

    fn validate_ssl_config(&self) -> Result<()> {
        if let Some(ssl) = &self.cfg.server.ssl {
            if !ssl.cert.exists() {
                anyhow::bail!("SSL certificate not found at: {}", ssl.cert.display());
            }
            if !ssl.key.exists() {
                anyhow::bail!("SSL key not found at: {}", ssl.key.display());
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let metadata = ssl.key.metadata()?;
                if metadata.permissions().mode() & 0o077 != 0 {
                    warn!(
                        "SECURITY: SSL Private Key {} has insecure permissions (should be 600)",
                        ssl.key.display()
                    );
                }
            }
        }
        Ok(())
    }

    /// Consumes the builder and initializes the server.
    ///
    /// # Process
    /// 1. Opens the storage root and loads the latest inventory snapshot
    /// 2. Initializes the event bus and every feature slice
    /// 3. Starts the audit listener so no activity is missed
    /// 4. Constructs application state
    ///
    /// # Errors
    /// Returns an error if:
    /// * The storage root can not be created or the snapshot is unreadable
    /// * A slice fails to bootstrap (for instance a snapshot without the core classes)
    /// * SSL certificate/key files are missing
    pub async fn build(self) -> Result<Server> {
        self.validate_ssl_config()?;

        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        info!(address = %address, data_dir = %self.cfg.storage.data_dir.display(), "Initializing server");

        let storage = self.init_storage().await?;
        let db = self.init_database(storage.clone()).await?;

        let events = EventBus::new();
        let slices = kuwaiba::init(&self.cfg, &db, &events, Some(&storage)).context("Inventory bootstrap failed")?;

        let state = ApiState::builder()
            .config(self.cfg)
            .db(db)
            .events(events)
            .storage(storage)
            .register_slices(slices)
            .build()
            .context("Failed to finalize API state registry")?;

        let audit = state
            .get_slice::<Audit>()
            .map(|audit| audit.listen(&state.events))
            .transpose()
            .context("Failed to start the audit listener")?;

        Ok(Server { state, audit })
    }
}

/// A fully initialized server instance ready to run.
///
/// This struct is returned by [`ServerBuilder::build`] and contains
/// all necessary runtime state.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
    audit: Option<JoinHandle<()>>,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Starts the server and runs until the shutdown signal is received, then writes the
    /// final snapshot.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the configured address, if SSL/TLS
    /// setup fails, or if the final snapshot can not be written.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.config.clone();
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);

        info!(address = %address, ssl = cfg.server.ssl.is_some(), "Starting server");

        let flusher = spawn_flusher(self.state.database.clone(), cfg.database.flush_interval_seconds);
        let app = router::init(self.state.clone());

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(30)));
        });

        let service = app.into_make_service_with_connect_info::<SocketAddr>();
        let served = if let Some(ssl_config) = &cfg.server.ssl {
            info!("Starting HTTPS server on https://{address}");

            let tls_config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&ssl_config.cert, &ssl_config.key)
                    .await
                    .context("Failed to load SSL/TLS certificates")?;

            axum_server::bind_rustls(address, tls_config).handle(handle).serve(service).await.context("HTTPS server failed")
        } else {
            info!("Starting HTTP server on http://{address}");

            axum_server::bind(address).handle(handle).serve(service).await.context("HTTP server failed")
        };

        if let Some(flusher) = flusher {
            flusher.abort();
        }
        self.shutdown().await?;
        served?;

        info!("Server shutdown complete");
        Ok(())
    }

    /// Stops the audit listener and writes the last snapshot.
    ///
    /// # Errors
    /// Returns an error if the snapshot can not be written.
    pub async fn shutdown(self) -> Result<()> {
        let channels = self.state.events.shutdown();
        if let Some(audit) = self.audit
            && let Err(e) = audit.await
        {
            warn!("Audit listener ended abnormally: {e}");
        }
        let written = self.state.database.flush().await.context("Failed to write the final snapshot")?;
        info!(channels, written, revision = self.state.database.revision(), "Inventory persisted");
        Ok(())
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }
}

/// Writes the snapshot every `interval_seconds` while there are unsaved changes. Zero
/// leaves persistence to shutdown.
fn spawn_flusher(database: Database, interval_seconds: u64) -> Option<JoinHandle<()>> {
    if interval_seconds == 0 {
        warn!("Periodic snapshots are disabled; changes are only persisted on shutdown");
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = database.flush().await {
                error!("Periodic snapshot failed: {e}");
            }
        }
    }))
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res.context("Ctrl+C signal received")?;
        },
        res = terminate => {
            res.context("SIGTERM signal received")?;
        },
    }

    Ok(())
}
