//! HTTP front of the heroes API.
//!
//! ```no_run
//! use cape_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder().port(5555).build().await?.run().await
//! }
//! ```

mod router;

use anyhow::{Context, Result, anyhow, bail};
use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use cape::domain::config::{ApiConfig, SslConfig};
use cape::kernel::server::ApiState;
use cape_database::Database;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

/// In-flight requests get this long to finish once shutdown starts.
const GRACE_PERIOD: Duration = Duration::from_secs(30);

#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
}

impl ServerBuilder {
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Opens the database, runs the slice migrations and bootstraps the slices.
    ///
    /// # Errors
    /// Fails on missing TLS files, an unreachable database, a failed or edited
    /// migration, or a slice that cannot initialize (seeding included).
    pub async fn build(self) -> Result<Server> {
        if let Some(ssl) = &self.cfg.server.ssl {
            check_ssl_files(ssl)?;
        }

        let db_cfg = &self.cfg.database;
        info!(url = %db_cfg.url, seed = db_cfg.seed, "Opening heroes database");
        let db = Database::builder()
            .url(&db_cfg.url)
            .max_connections(db_cfg.max_connections)
            .migrations(cape::migrations())
            .init()
            .await
            .with_context(|| format!("Opening database {}", db_cfg.url))?;

        let slices = cape::init(&self.cfg, &db).await.map_err(|e| anyhow!("Slice bootstrap failed: {e}"))?;

        let state = ApiState::builder()
            .config(self.cfg)
            .db(db)
            .register_slices(slices)
            .build()
            .context("Building API state")?;
        info!(slices = ?state.slice_names().collect::<Vec<_>>(), "Server ready");

        Ok(Server { state })
    }
}

fn check_ssl_files(ssl: &SslConfig) -> Result<()> {
    for (what, path) in [("certificate", &ssl.cert), ("key", &ssl.key)] {
        if !path.exists() {
            bail!("TLS {what} not found at {}", path.display());
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if ssl.key.metadata()?.permissions().mode() & 0o077 != 0 {
            warn!(key = %ssl.key.display(), "TLS key is readable by group or others");
        }
    }
    Ok(())
}

#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Heroes routes, system routes and the `/api` reference, with request tracing.
    pub fn router(&self) -> Router {
        router::init(self.state.clone())
    }

    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }

    /// Serves until SIGINT or SIGTERM, then drains for [`GRACE_PERIOD`].
    ///
    /// # Errors
    /// Fails when the address cannot be bound or the TLS files cannot be loaded.
    pub async fn run(self) -> Result<()> {
        let server = &self.state.config.server;
        let address = SocketAddr::new(server.address, server.port);
        let app = self.router();

        let handle = Handle::<SocketAddr>::new();
        tokio::spawn(drain_on_signal(handle.clone()));

        match &server.ssl {
            Some(ssl) => {
                let tls = RustlsConfig::from_pem_file(&ssl.cert, &ssl.key)
                    .await
                    .context("Loading TLS certificate and key")?;
                info!("Listening on https://{address}");
                axum_server::bind_rustls(address, tls)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
                    .context("HTTPS listener stopped")?;
            },
            None => {
                info!("Listening on http://{address}");
                axum_server::bind(address)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
                    .context("HTTP listener stopped")?;
            },
        }

        info!("Server stopped");
        Ok(())
    }
}

async fn drain_on_signal(handle: Handle<SocketAddr>) {
    match shutdown_signal().await {
        Ok(()) => {
            info!(grace = ?GRACE_PERIOD, "Shutting down");
            handle.graceful_shutdown(Some(GRACE_PERIOD));
        },
        Err(e) => error!("Cannot listen for shutdown signals: {e:#}"),
    }
}

async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Installing Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Installing SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res,
        res = terminate => res,
    }
}
