use std::sync::Arc;

use behavior_events::collaborators::Mailer;
use behavior_events::{
    BehaviorDispatcher, BehaviorRouter, Collaborators, DisabledMailer, EmailConfig, EventBus,
    PgBackend, SmtpMailer, TriggerListener,
};
use behavior_worker::config::WorkerConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "behavior_worker=info,behavior_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env().expect("Invalid worker configuration");
    tracing::info!(
        db_max_connections = config.db_max_connections,
        event_bus_capacity = config.event_bus_capacity,
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = behavior_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");
    behavior_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    behavior_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Mail transport ---
    let mailer: Arc<dyn Mailer> = match EmailConfig::from_env() {
        Some(email_config) => {
            tracing::info!(host = %email_config.smtp_host, port = email_config.smtp_port, "SMTP configured");
            Arc::new(SmtpMailer::new(&email_config).expect("Invalid SMTP configuration"))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, email behaviors will be dropped");
            Arc::new(DisabledMailer)
        }
    };

    // --- Engine ---
    let backend = Arc::new(PgBackend::new(pool.clone()));
    let dispatcher = BehaviorDispatcher::new(Collaborators::new(backend, mailer));
    let store = dispatcher.store().clone();
    match store.get_all().await {
        Ok(index) => tracing::info!(behaviors = index.len(), "Behavior snapshot warmed"),
        Err(e) => tracing::error!(error = %e, "Failed to warm behavior snapshot"),
    }

    // --- Event services ---
    let bus = Arc::new(EventBus::new(config.event_bus_capacity));
    let cancel = CancellationToken::new();

    let router_handle = tokio::spawn(
        BehaviorRouter::new(dispatcher).run(bus.subscribe(), cancel.clone()),
    );

    let listener = TriggerListener::new(pool, Arc::clone(&bus), store);
    let listener_cancel = cancel.clone();
    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener.run(listener_cancel).await {
            tracing::error!(error = %e, "Trigger listener stopped");
        }
    });

    tracing::info!("Behavior worker started");

    // --- Shutdown ---
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
    cancel.cancel();

    let _ = listener_handle.await;
    let _ = router_handle.await;
    tracing::info!("Behavior worker stopped");
}
