/**
 * COMPLIANCE KERNEL - Point d'entrée principal du serveur de conformité
 *
 * RÔLE : Orchestration de tous les modules : config, seed, agrégation, HTTP,
 * notifications, health. Bootstrap du système avec gestion d'erreurs et logging.
 *
 * ARCHITECTURE : Dataset immuable partagé (Arc) + API REST + notifications fire-and-forget.
 * UTILITÉ : Backend du dashboard de conformité, point d'administration unique.
 */

mod state;
mod config;
mod mqtt;
mod health;
mod notifications;
mod http;

use crate::config::load_config;
use crate::health::HealthTracker;
use crate::http::AppState;
use crate::notifications::NotificationHub;
use anyhow::Context;
use compliance_core::ComplianceAggregator;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();
    init_logging();

    let cfg = load_config().await;

    // dataset : seed intégré ou fichier JSON, fatal si invalide
    let source = cfg.data_source();
    let dataset = source
        .load()
        .with_context(|| format!("failed to load dataset from {}", source.describe()))?;
    info!("[kernel] dataset loaded from {}", source.describe());
    let aggregator = ComplianceAggregator::new(dataset, cfg.summary_options());

    // health tracker
    let health_tracker = HealthTracker::new();

    // notifications (+ MQTT optionnel)
    let mut notifications = NotificationHub::new(cfg.notifications.capacity);
    if let Some(mqtt_conf) = &cfg.mqtt {
        health_tracker.mark_mqtt_connecting();
        let client = mqtt::spawn_mqtt_client(mqtt_conf, health_tracker.clone());
        notifications = notifications.with_mqtt_client(client);
        info!("[kernel] publishing notifications to {}:{}", mqtt_conf.host, mqtt_conf.port);
    }

    if cfg.api_key.is_none() {
        warn!("[kernel] COMPLIANCE_API_KEY not set, only /health will answer");
    }

    // fabrique l'état unique pour Axum
    let app_state = AppState {
        aggregator,
        notifications,
        health_tracker,
        api_key: cfg.api_key.clone(),
    };

    // HTTP
    let app = http::build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http.port));
    info!("[kernel] listening on http://{addr}");
    let listener = TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
