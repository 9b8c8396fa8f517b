use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tokio::net::TcpListener;
use tracing::info;

pub mod error;
pub mod normalize;
pub mod notify;
pub mod persist;
pub mod settings;
pub mod storage;
pub mod validate;
pub mod webhook;

pub use webhook::{router, AppState};

pub async fn real_main(
    config_path: String,
    shutdown: impl Future<Output = std::io::Result<()>> + Send + 'static,
) -> anyhow::Result<()> {
    let settings = settings::Settings::new(&config_path)?;

    let db = if settings.save_mail_to_db() {
        let url = settings.get_db_url().ok_or_else(|| {
            anyhow::anyhow!("save_mail_to_db is enabled but no [database] section is configured")
        })?;
        let db = Database::connect(url).await?;
        Migrator::up(&db, None).await?;
        Some(db)
    } else {
        None
    };

    let encode_attachments = settings.encode_attachments();
    let mut state = AppState::new(settings, db);
    state
        .broadcaster
        .register(Arc::new(notify::LogListener { encode_attachments }));
    let state = Arc::new(state);

    let listener = TcpListener::bind(state.settings.get_listen_address()).await?;
    info!(address = %listener.local_addr()?, "listening for inbound webhooks");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = shutdown.await;
    })
    .await?;

    Ok(())
}
