use crate::notifications::NotificationHub;
use compliance_core::ComplianceAggregator;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelHealth {
    pub started_at: String,
    pub uptime_seconds: u64,
    pub devices_loaded: u32,
    pub policies_loaded: u32,
    pub open_alerts: u32,
    pub notifications_emitted: u64,
    pub notifications_published: bool, // relayées sur MQTT
    pub memory_usage_mb: f32,
    pub mqtt_status: String,
    pub mqtt_reconnects: u32,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    started_at: OffsetDateTime,
    mqtt_reconnects: Arc<AtomicU32>,
    mqtt_status: Arc<parking_lot::Mutex<String>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            started_at: OffsetDateTime::now_utc(),
            mqtt_reconnects: Arc::new(AtomicU32::new(0)),
            mqtt_status: Arc::new(parking_lot::Mutex::new("disabled".to_string())),
        }
    }

    pub fn mark_mqtt_connecting(&self) {
        *self.mqtt_status.lock() = "connecting".to_string();
    }

    pub fn mark_mqtt_connected(&self) {
        *self.mqtt_status.lock() = "connected".to_string();
    }

    pub fn increment_reconnects(&self) {
        self.mqtt_reconnects.fetch_add(1, Ordering::Relaxed);
        *self.mqtt_status.lock() = "reconnecting".to_string();
    }

    pub fn get_health(&self, aggregator: &ComplianceAggregator, notifications: &NotificationHub) -> KernelHealth {
        let dataset = aggregator.dataset();

        KernelHealth {
            started_at: self.started_at.format(&Rfc3339).unwrap_or_default(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            devices_loaded: dataset.devices.len() as u32,
            policies_loaded: dataset.policies.len() as u32,
            open_alerts: dataset.alerts.iter().filter(|a| !a.resolved).count() as u32,
            notifications_emitted: notifications.emitted(),
            notifications_published: notifications.is_publishing(),
            memory_usage_mb: get_memory_usage_mb(),
            mqtt_status: self.mqtt_status.lock().clone(),
            mqtt_reconnects: self.mqtt_reconnects.load(Ordering::Relaxed),
        }
    }
}

fn get_memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    if let Some(kb) = line.split_whitespace().nth(1).and_then(|s| s.parse::<u64>().ok()) {
                        return (kb as f32) / 1024.0; // KB -> MB
                    }
                }
            }
        }
    }

    // Pas de /proc : valeur inconnue
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_core::{BuiltinSeed, DataSource, SummaryOptions};

    #[test]
    fn test_health_counts() {
        let aggregator = ComplianceAggregator::new(BuiltinSeed.load().unwrap(), SummaryOptions::default());
        let hub = NotificationHub::new(10);
        let tracker = HealthTracker::new();

        let health = tracker.get_health(&aggregator, &hub);
        assert_eq!(health.devices_loaded, 10);
        assert_eq!(health.policies_loaded, 6);
        assert_eq!(health.open_alerts, 4);
        assert_eq!(health.notifications_emitted, 0);
        assert!(!health.notifications_published);
        assert_eq!(health.mqtt_status, "disabled");
    }

    #[test]
    fn test_mqtt_status_transitions() {
        let tracker = HealthTracker::new();
        tracker.mark_mqtt_connecting();
        assert_eq!(*tracker.mqtt_status.lock(), "connecting");
        tracker.increment_reconnects();
        tracker.increment_reconnects();
        assert_eq!(*tracker.mqtt_status.lock(), "reconnecting");
        assert_eq!(tracker.mqtt_reconnects.load(Ordering::Relaxed), 2);
        tracker.mark_mqtt_connected();
        assert_eq!(*tracker.mqtt_status.lock(), "connected");
    }
}
