pub mod allocator;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod reports;
pub mod services;
pub mod store;

use std::sync::Arc;

pub use error::{ReservationError, Result};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
    pub bookings: services::BookingService<store::PgStore>,
    pub catalog: services::CatalogService<store::PgStore>,
    pub reports: reports::Reports,
}

impl AppState {
    pub async fn new(config: config::Config) -> std::result::Result<Arc<Self>, Box<dyn std::error::Error>> {
        let db = database::Database::new(&config.database).await?;

        db.run_migrations().await?;

        let store = Arc::new(store::PgStore::new(db.pool.clone()));
        let bookings = services::BookingService::new(store.clone());
        let catalog = services::CatalogService::new(store);
        let reports = reports::Reports::new(db.pool.clone());

        Ok(Arc::new(Self {
            db,
            config,
            bookings,
            catalog,
            reports,
        }))
    }
}
