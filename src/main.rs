use garage_settlement::api::{create_router, AppState};
use garage_settlement::config::Settings;
use garage_settlement::gateway::{CallbackVerifier, PaymentRequestBuilder};
use garage_settlement::observability::{init_logging, mask_sensitive, LogConfig};
use garage_settlement::services::{
    BookingService, CartStore, CheckoutService, InMemoryCartStore, ReceptionService,
    RepairService, SettlementService,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;

    init_logging(&LogConfig {
        level: settings.application.log_level.clone(),
        ..LogConfig::default()
    });
    info!(
        tmn_code = %mask_sensitive(&settings.gateway.tmn_code, 2),
        "Configuration loaded"
    );

    // Connect to PostgreSQL
    let pool = PgPoolOptions::new()
        .max_connections(settings.database.pool_size)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&settings.database.url)
        .await?;
    info!("Database connection established");

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations applied successfully");

    let cart: Arc<dyn CartStore> = Arc::new(InMemoryCartStore::new());
    let builder = PaymentRequestBuilder::new(settings.gateway.clone());
    let verifier = CallbackVerifier::new(settings.gateway.clone());

    let state = AppState {
        pool: pool.clone(),
        booking: Arc::new(BookingService::new(
            pool.clone(),
            settings.application.max_slots_per_day,
        )),
        reception: Arc::new(ReceptionService::new(pool.clone())),
        repair: Arc::new(RepairService::new(pool.clone())),
        checkout: Arc::new(CheckoutService::new(
            pool.clone(),
            cart.clone(),
            builder,
            settings.application.vat_rate,
        )),
        settlement: Arc::new(SettlementService::new(pool, verifier, cart.clone())),
        cart,
        vat_rate: settings.application.vat_rate,
    };

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", settings.application.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
