use std::sync::Arc;

use axum::Router;
use migration::{Migrator, MigratorTrait};
use postmark_inbound::settings::Settings;
use postmark_inbound::webhook::{router, AppState};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub async fn connect() -> DatabaseConnection {
    // a pooled second connection would see a different in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);

    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub fn load_settings(config: &str) -> Settings {
    Settings::new(&format!("tests/common/{config}")).unwrap()
}

pub async fn setup(config: &str) -> (Router, DatabaseConnection) {
    let db = connect().await;
    let state = Arc::new(AppState::new(load_settings(config), Some(db.clone())));
    (router(state), db)
}
