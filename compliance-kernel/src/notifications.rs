/**
 * NOTIFICATIONS - Diffusion fire-and-forget des résultats d'actions simulées
 *
 * RÔLE : Chaque action acceptée produit une notification (toast) qui est :
 * - loggée via tracing
 * - conservée dans une file bornée (GET /notifications)
 * - publiée sur MQTT si un broker est configuré (QoS 0, sans attente)
 *
 * Aucun retry, aucun timeout : un échec de publication est loggé puis oublié.
 */

use crate::mqtt::NOTIFICATIONS_TOPIC;
use crate::state::{new_state, push_bounded, Shared};
use compliance_core::{Notification, NotificationLevel};
use rumqttc::{AsyncClient, QoS};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct NotificationHub {
    recent: Shared<VecDeque<Notification>>,
    capacity: usize,
    emitted: Arc<AtomicU64>,
    mqtt_client: Option<AsyncClient>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: new_state(VecDeque::with_capacity(capacity)),
            capacity,
            emitted: Arc::new(AtomicU64::new(0)),
            mqtt_client: None,
        }
    }

    pub fn with_mqtt_client(mut self, client: AsyncClient) -> Self {
        self.mqtt_client = Some(client);
        self
    }

    pub fn dispatch(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => warn!("[actions] {} ({})", notification.title, notification.action),
            _ => info!("[actions] {} ({})", notification.title, notification.action),
        }

        if let Some(client) = &self.mqtt_client {
            match serde_json::to_vec(&notification) {
                Ok(payload) => {
                    if let Err(e) = client.try_publish(NOTIFICATIONS_TOPIC, QoS::AtMostOnce, false, payload) {
                        warn!("[actions] failed to publish notification {}: {e:?}", notification.id);
                    }
                }
                Err(e) => warn!("[actions] failed to encode notification: {e}"),
            }
        }

        self.emitted.fetch_add(1, Ordering::Relaxed);
        push_bounded(&self.recent, notification, self.capacity);
    }

    /// Notifications récentes, la plus récente en premier
    pub fn recent(&self, limit: usize) -> Vec<Notification> {
        self.recent.lock().iter().rev().take(limit).cloned().collect()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    pub fn is_publishing(&self) -> bool {
        self.mqtt_client.is_some()
    }
}
