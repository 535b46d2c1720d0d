use crate::config::MqttConf;
use crate::health::HealthTracker;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions};
use std::time::Duration;
use tokio::task;
use tracing::{info, warn};

pub const NOTIFICATIONS_TOPIC: &str = "compliance/notifications@v1";

/// Crée le client MQTT du kernel et spawn la boucle d'événements.
/// Le kernel ne s'abonne à rien : il publie seulement les notifications.
pub fn spawn_mqtt_client(conf: &MqttConf, health: HealthTracker) -> AsyncClient {
    let mut opts = MqttOptions::new("compliance-kernel", &conf.host, conf.port);
    opts.set_keep_alive(Duration::from_secs(15));
    let (client, mut eventloop) = AsyncClient::new(opts, 10);

    let broker = format!("{}:{}", conf.host, conf.port);
    task::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("[mqtt] connected to {broker}");
                    health.mark_mqtt_connected();
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("[mqtt] connection error: {e:?}");
                    health.increment_reconnects();
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });

    client
}
