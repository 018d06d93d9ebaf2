//! ministore server — a minimalist S3-compatible object-storage server.
//!
//! # Usage
//!
//! ```text
//! LISTEN=0.0.0.0:9000 ministore-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LISTEN` | `0.0.0.0:9000` | Bind address |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `DATA_DIR` | *(unset)* | Payload directory; in-memory when unset |
//! | `MAX_OBJECT_SIZE` | 5 GiB | Single-object/part size ceiling |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ministore_core::{DiskDriver, Driver, MemoryDriver, ServiceConfig};
use ministore_http::{ApiHandler, S3Service};

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Pick the driver implementation from the configuration.
fn build_driver(config: &ServiceConfig) -> Result<Arc<dyn Driver>> {
    match &config.data_dir {
        Some(dir) => {
            info!(data_dir = %dir, "using disk-backed payload storage");
            let driver =
                DiskDriver::open(dir).with_context(|| format!("opening data directory {dir}"))?;
            Ok(Arc::new(driver))
        }
        None => {
            info!("using in-memory payload storage");
            Ok(Arc::new(MemoryDriver::new()))
        }
    }
}

/// Run the accept loop until a shutdown signal arrives.
async fn serve(listener: TcpListener, service: S3Service) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        listen = %config.listen,
        data_dir = ?config.data_dir,
        max_object_size = config.max_object_size,
        "starting ministore server",
    );

    let driver = build_driver(&config)?;
    let handler = ApiHandler::new(driver).with_max_object_size(config.max_object_size);
    let service = S3Service::new(handler);

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
