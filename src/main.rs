use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use tower_http::trace::TraceLayer;

use booking_server::{
    config::AppConfig,
    db::entities::prelude::{Reservation, User},
    logging::init_tracing,
    payments::MercadoPago,
    routes::router,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_tracing(&cfg.log_level);

    let mut opt = ConnectOptions::new(cfg.database_url.clone());
    opt.connect_timeout(Duration::from_secs(5)).sqlx_logging(false);

    let db = Database::connect(opt).await?;
    tracing::info!("ensuring database schema");
    create_tables(&db).await?;

    let payments = Arc::new(MercadoPago::new(
        cfg.mp_base_url.clone(),
        cfg.mp_access_token.clone(),
    ));
    let state = AppState::new(cfg.clone(), db, payments);

    let app = Router::new()
        .merge(router(Arc::clone(&state)))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .map_err(|err| anyhow::anyhow!("invalid host/port: {err}"))?;
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn create_tables(db: &DatabaseConnection) -> anyhow::Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut users = schema.create_table_from_entity(User);
    db.execute(backend.build(users.if_not_exists())).await?;

    let mut reservations = schema.create_table_from_entity(Reservation);
    db.execute(backend.build(reservations.if_not_exists()))
        .await?;

    Ok(())
}
