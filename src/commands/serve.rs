//! Long-running service: HTTP API, periodic sync and device events.

use clap::Args;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::driver::Driver;
use crate::server::{router, AppState};

#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Port to listen on (overrides PORT and the config file)
    #[arg(long, short)]
    port: Option<u16>,

    /// Do not subscribe to device events; rely on the timer only
    #[arg(long)]
    no_events: bool,
}

impl ServeCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let toggl = config.toggl_client()?;
        let particle = config.particle_client()?;
        let table = config.position_table()?;

        let driver = Arc::new(Driver::new(
            Arc::new(toggl.clone()),
            Arc::new(particle.clone()),
            table,
        ));

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let mut tasks = vec![driver
            .clone()
            .spawn_timer(config.sync_period(), shutdown_tx.subscribe())];
        tracing::info!("Syncing every {} ms", config.sync_period_ms.value);

        if config.subscribe_events.value && !self.no_events {
            tasks.push(
                driver
                    .clone()
                    .spawn_event_listener(particle.clone(), shutdown_tx.subscribe()),
            );
        }

        let app = router(AppState {
            driver,
            toggl,
            particle,
        });

        let port = self.port.unwrap_or(config.port.value);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        tracing::info!("Starting server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Shutting down");
        let _ = shutdown_tx.send(());
        for task in tasks {
            let _ = task.await;
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
