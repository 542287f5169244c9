//! TCP ingestion service
//!
//! Accepts clients on `host:port`, stores what they send in the configured
//! sink and echoes the stored log back after every completed line. Runs
//! until SIGINT/SIGTERM (or a caller-supplied shutdown future), then
//! releases the sink.

mod connection;
mod errors;
mod framing;
mod sink;

pub use connection::Connection;
pub use errors::{ServerError, ServerResult};
pub use framing::{parse_control, CONTROL_PREFIX};
pub use sink::{FileSink, Session, Sink};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::observability::{log_event, log_event_with_fields, log_metrics, Event, MetricsRegistry};

/// Bound ingestion server
pub struct Server {
    config: Config,
    listener: TcpListener,
    sink: Sink,
    metrics: Arc<MetricsRegistry>,
}

impl Server {
    /// Bind the listener and build the sink described by `config`
    pub async fn bind(config: Config) -> ServerResult<Self> {
        config.validate()?;

        let addr = config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr: addr.clone(), source })?;

        let metrics = Arc::new(MetricsRegistry::new());
        let sink = Sink::from_config(&config, Arc::clone(&metrics))?;

        Ok(Self {
            config,
            listener,
            sink,
            metrics,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Serve until SIGINT or SIGTERM
    pub async fn run(self) -> ServerResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` completes
    pub async fn run_until<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()>,
    {
        let local = self.local_addr()?.to_string();
        let backend = format!("{:?}", self.config.backend).to_lowercase();
        log_event_with_fields(
            Event::ServerStart,
            &[("addr", local.as_str()), ("backend", backend.as_str())],
        );

        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            self.metrics.increment_connections();
                            let connection = Connection::new(
                                stream,
                                peer,
                                self.sink.session(),
                                self.config.recv_buffer_bytes,
                            );
                            connections.spawn(connection.run());
                        }
                        Err(e) => {
                            log_event_with_fields(
                                Event::ConnectionFailed,
                                &[("error", e.to_string().as_str())],
                            );
                        }
                    }
                }

                Some(_) = connections.join_next(), if !connections.is_empty() => {}

                _ = &mut shutdown => {
                    log_event(Event::ShutdownSignal);
                    break;
                }
            }
        }

        connections.shutdown().await;
        drop(self.listener);

        self.sink.shutdown().await?;
        log_metrics(&self.metrics.snapshot());
        log_event(Event::ServerStop);

        Ok(())
    }
}

/// Resolves on the first SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
