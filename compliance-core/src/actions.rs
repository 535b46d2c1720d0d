/**
 * ACTIONS SIMULÉES - Commandes administratives sans effet sur les données
 *
 * RÔLE : Valide la cible d'une action (restart, push policy, resolve alert...)
 * et construit la notification transitoire affichée à l'administrateur.
 *
 * FONCTIONNEMENT : `simulate` est pure. Le jeu de données n'est jamais modifié :
 * résoudre une alerte ne la marque pas résolue, redémarrer ne change pas lastSeen.
 * Pas de retry, pas de timeout, pas d'annulation : l'action n'existe que
 * sous forme de notification (fire-and-forget côté kernel).
 */

use crate::aggregator::find_device;
use crate::models::{ComplianceStatus, Dataset, Device};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

const SHORTLY: &str = "Action will be completed shortly.";

// Messages MQTT/HTTP entrants (format: {"action": "restart_device", "deviceId": "dev-001"})
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ActionRequest {
    RestartDevice { device_id: String },
    SyncDevice { device_id: String },
    NotifyUser { device_id: String },
    RemoveDevice { device_id: String },
    RefreshPolicies { device_id: String },
    ExportAlerts { device_id: String },
    RemediatePolicy { device_id: String, policy_id: String },
    PushPolicy { policy_id: String },
    ResolveAlert { alert_id: String },
    RunInsight { insight_id: String },
    DismissInsight { insight_id: String },
    BatchUpdate,
    ExportDevices,
    RefreshDashboard,
    AddPolicy,
}

impl ActionRequest {
    /// Nom wire de l'action (identique au tag JSON)
    pub fn kind(&self) -> &'static str {
        match self {
            ActionRequest::RestartDevice { .. } => "restart_device",
            ActionRequest::SyncDevice { .. } => "sync_device",
            ActionRequest::NotifyUser { .. } => "notify_user",
            ActionRequest::RemoveDevice { .. } => "remove_device",
            ActionRequest::RefreshPolicies { .. } => "refresh_policies",
            ActionRequest::ExportAlerts { .. } => "export_alerts",
            ActionRequest::RemediatePolicy { .. } => "remediate_policy",
            ActionRequest::PushPolicy { .. } => "push_policy",
            ActionRequest::ResolveAlert { .. } => "resolve_alert",
            ActionRequest::RunInsight { .. } => "run_insight",
            ActionRequest::DismissInsight { .. } => "dismiss_insight",
            ActionRequest::BatchUpdate => "batch_update",
            ActionRequest::ExportDevices => "export_devices",
            ActionRequest::RefreshDashboard => "refresh_dashboard",
            ActionRequest::AddPolicy => "add_policy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// Notification transitoire (toast) produite par une action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub title: String,
    pub description: Option<String>,
    pub action: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Notification {
    fn new(request: &ActionRequest, level: NotificationLevel, title: String, description: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            title,
            description: description.map(str::to_string),
            action: request.kind().to_string(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    #[error("Policy not found: {0}")]
    PolicyNotFound(String),
    #[error("Alert not found: {0}")]
    AlertNotFound(String),
    #[error("Insight not found: {0}")]
    InsightNotFound(String),
    #[error("Alert {0} is already resolved")]
    AlreadyResolved(String),
    #[error("Policy {policy_id} is already compliant on {device_id}")]
    NothingToRemediate { device_id: String, policy_id: String },
}

fn device<'a>(dataset: &'a Dataset, id: &str) -> Result<&'a Device, ActionError> {
    find_device(&dataset.devices, id).ok_or_else(|| ActionError::DeviceNotFound(id.to_string()))
}

/// Valide la cible et construit la notification, sans toucher au dataset
pub fn simulate(dataset: &Dataset, request: &ActionRequest) -> Result<Notification, ActionError> {
    use NotificationLevel::{Error, Info, Success};

    let notification = match request {
        ActionRequest::RestartDevice { device_id } => {
            let target = device(dataset, device_id)?;
            Notification::new(
                request,
                Success,
                format!("Restart initiated for {}", target.name),
                Some("Device will restart and apply pending updates"),
            )
        }
        ActionRequest::SyncDevice { device_id }
        | ActionRequest::NotifyUser { device_id }
        | ActionRequest::RefreshPolicies { device_id }
        | ActionRequest::ExportAlerts { device_id } => {
            let target = device(dataset, device_id)?;
            let label = match request {
                ActionRequest::SyncDevice { .. } => "Sync",
                ActionRequest::NotifyUser { .. } => "Notification",
                ActionRequest::RefreshPolicies { .. } => "Policy Refresh",
                _ => "Export Alerts",
            };
            Notification::new(request, Success, format!("{label} initiated for {}", target.name), Some(SHORTLY))
        }
        ActionRequest::RemoveDevice { device_id } => {
            device(dataset, device_id)?;
            Notification::new(request, Error, "Device removal initiated".into(), Some("This action cannot be undone"))
        }
        ActionRequest::RemediatePolicy { device_id, policy_id } => {
            let target = device(dataset, device_id)?;
            let assignment = target
                .policies
                .iter()
                .find(|p| &p.policy_id == policy_id)
                .ok_or_else(|| ActionError::PolicyNotFound(policy_id.clone()))?;
            let policy = dataset
                .policies
                .iter()
                .find(|p| &p.id == policy_id)
                .ok_or_else(|| ActionError::PolicyNotFound(policy_id.clone()))?;
            if assignment.status == ComplianceStatus::Compliant {
                return Err(ActionError::NothingToRemediate {
                    device_id: device_id.clone(),
                    policy_id: policy_id.clone(),
                });
            }
            Notification::new(
                request,
                Success,
                format!("Remediate {} initiated for {}", policy.name, target.name),
                Some(SHORTLY),
            )
        }
        ActionRequest::PushPolicy { policy_id } => {
            let policy = dataset
                .policies
                .iter()
                .find(|p| &p.id == policy_id)
                .ok_or_else(|| ActionError::PolicyNotFound(policy_id.clone()))?;
            Notification::new(
                request,
                Success,
                format!("Policy update initiated: {}", policy.name),
                Some("Pushing policy update to affected devices"),
            )
        }
        ActionRequest::ResolveAlert { alert_id } => {
            let alert = dataset
                .alerts
                .iter()
                .find(|a| &a.id == alert_id)
                .ok_or_else(|| ActionError::AlertNotFound(alert_id.clone()))?;
            if alert.resolved {
                return Err(ActionError::AlreadyResolved(alert_id.clone()));
            }
            let description = format!("Alert: {}", alert.message);
            Notification::new(request, Success, "Alert marked as resolved".into(), Some(description.as_str()))
        }
        ActionRequest::RunInsight { insight_id } | ActionRequest::DismissInsight { insight_id } => {
            let insight = dataset
                .insights
                .iter()
                .find(|i| &i.id == insight_id)
                .ok_or_else(|| ActionError::InsightNotFound(insight_id.clone()))?;
            if matches!(request, ActionRequest::DismissInsight { .. }) {
                Notification::new(request, Success, "Marked as resolved".into(), None)
            } else {
                let description = format!("For {} affected devices", insight.device_count);
                Notification::new(
                    request,
                    Success,
                    format!("Action initiated: {}", insight.recommended_action),
                    Some(description.as_str()),
                )
            }
        }
        ActionRequest::BatchUpdate => Notification::new(
            request,
            Success,
            "Batch update initiated".into(),
            Some("Updates are being pushed to all affected devices"),
        ),
        ActionRequest::ExportDevices => Notification::new(
            request,
            Success,
            "Exporting device data".into(),
            Some("Your report will be ready to download shortly"),
        ),
        ActionRequest::RefreshDashboard => Notification::new(
            request,
            Success,
            "Dashboard refreshed".into(),
            Some("Data has been updated to the latest version"),
        ),
        ActionRequest::AddPolicy => Notification::new(
            request,
            Info,
            "Feature coming soon".into(),
            Some("The ability to add custom policies will be available in a future update"),
        ),
    };

    Ok(notification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{BuiltinSeed, DataSource};

    fn seed() -> Dataset {
        BuiltinSeed.load().unwrap()
    }

    #[test]
    fn test_request_wire_format() {
        let request: ActionRequest =
            serde_json::from_str(r#"{"action": "remediate_policy", "deviceId": "dev-002", "policyId": "pol-002"}"#)
                .unwrap();
        assert_eq!(
            request,
            ActionRequest::RemediatePolicy { device_id: "dev-002".into(), policy_id: "pol-002".into() }
        );
        assert_eq!(request.kind(), "remediate_policy");

        let batch: ActionRequest = serde_json::from_str(r#"{"action": "batch_update"}"#).unwrap();
        assert_eq!(batch, ActionRequest::BatchUpdate);

        assert!(serde_json::from_str::<ActionRequest>(r#"{"action": "format_disk"}"#).is_err());
    }

    #[test]
    fn test_restart_notification() {
        let data = seed();
        let n = simulate(&data, &ActionRequest::RestartDevice { device_id: "dev-002".into() }).unwrap();
        assert_eq!(n.level, NotificationLevel::Success);
        assert_eq!(n.title, "Restart initiated for DESKTOP-SARAH456");
        assert_eq!(n.description.as_deref(), Some("Device will restart and apply pending updates"));
        assert_eq!(n.action, "restart_device");
    }

    #[test]
    fn test_notification_texts() {
        use NotificationLevel::{Error, Info, Success};

        let data = seed();
        let dev = |id: &str| id.to_string();
        let cases: Vec<(ActionRequest, NotificationLevel, &str, Option<&str>)> = vec![
            (
                ActionRequest::RestartDevice { device_id: dev("dev-001") },
                Success,
                "Restart initiated for LAPTOP-MARK123",
                Some("Device will restart and apply pending updates"),
            ),
            (ActionRequest::SyncDevice { device_id: dev("dev-001") }, Success, "Sync initiated for LAPTOP-MARK123", Some(SHORTLY)),
            (
                ActionRequest::NotifyUser { device_id: dev("dev-001") },
                Success,
                "Notification initiated for LAPTOP-MARK123",
                Some(SHORTLY),
            ),
            (
                ActionRequest::RefreshPolicies { device_id: dev("dev-001") },
                Success,
                "Policy Refresh initiated for LAPTOP-MARK123",
                Some(SHORTLY),
            ),
            (
                ActionRequest::ExportAlerts { device_id: dev("dev-001") },
                Success,
                "Export Alerts initiated for LAPTOP-MARK123",
                Some(SHORTLY),
            ),
            (
                ActionRequest::RemoveDevice { device_id: dev("dev-001") },
                Error,
                "Device removal initiated",
                Some("This action cannot be undone"),
            ),
            (
                ActionRequest::PushPolicy { policy_id: "pol-002".into() },
                Success,
                "Policy update initiated: Windows Firewall",
                Some("Pushing policy update to affected devices"),
            ),
            (
                ActionRequest::BatchUpdate,
                Success,
                "Batch update initiated",
                Some("Updates are being pushed to all affected devices"),
            ),
            (
                ActionRequest::ExportDevices,
                Success,
                "Exporting device data",
                Some("Your report will be ready to download shortly"),
            ),
            (
                ActionRequest::RefreshDashboard,
                Success,
                "Dashboard refreshed",
                Some("Data has been updated to the latest version"),
            ),
            (
                ActionRequest::AddPolicy,
                Info,
                "Feature coming soon",
                Some("The ability to add custom policies will be available in a future update"),
            ),
        ];

        for (request, level, title, description) in cases {
            let n = simulate(&data, &request).unwrap();
            assert_eq!(n.level, level, "{}", request.kind());
            assert_eq!(n.title, title, "{}", request.kind());
            assert_eq!(n.description.as_deref(), description, "{}", request.kind());
            assert_eq!(n.action, request.kind());
        }
    }

    #[test]
    fn test_device_page_actions_wire_format() {
        let refresh: ActionRequest =
            serde_json::from_str(r#"{"action": "refresh_policies", "deviceId": "dev-004"}"#).unwrap();
        assert_eq!(refresh, ActionRequest::RefreshPolicies { device_id: "dev-004".into() });

        let export: ActionRequest = serde_json::from_str(r#"{"action": "export_alerts", "deviceId": "dev-004"}"#).unwrap();
        assert_eq!(export.kind(), "export_alerts");
        assert_eq!(
            simulate(&seed(), &ActionRequest::ExportAlerts { device_id: "dev-404".into() }),
            Err(ActionError::DeviceNotFound("dev-404".into()))
        );
    }

    #[test]
    fn test_unknown_targets() {
        let data = seed();
        assert_eq!(
            simulate(&data, &ActionRequest::SyncDevice { device_id: "dev-404".into() }),
            Err(ActionError::DeviceNotFound("dev-404".into()))
        );
        assert_eq!(
            simulate(&data, &ActionRequest::PushPolicy { policy_id: "pol-999".into() }),
            Err(ActionError::PolicyNotFound("pol-999".into()))
        );
        assert_eq!(
            simulate(&data, &ActionRequest::ResolveAlert { alert_id: "alert-999".into() }),
            Err(ActionError::AlertNotFound("alert-999".into()))
        );
        assert_eq!(
            simulate(&data, &ActionRequest::RunInsight { insight_id: "insight-999".into() }),
            Err(ActionError::InsightNotFound("insight-999".into()))
        );
    }

    #[test]
    fn test_resolve_alert() {
        let data = seed();
        let n = simulate(&data, &ActionRequest::ResolveAlert { alert_id: "alert-001".into() }).unwrap();
        assert_eq!(n.title, "Alert marked as resolved");
        assert_eq!(n.description.as_deref(), Some("Alert: Firewall disabled on device"));

        // alert-005 est déjà résolue dans le seed
        assert_eq!(
            simulate(&data, &ActionRequest::ResolveAlert { alert_id: "alert-005".into() }),
            Err(ActionError::AlreadyResolved("alert-005".into()))
        );
    }

    #[test]
    fn test_remediate_policy() {
        let data = seed();
        let n = simulate(
            &data,
            &ActionRequest::RemediatePolicy { device_id: "dev-002".into(), policy_id: "pol-002".into() },
        )
        .unwrap();
        assert_eq!(n.title, "Remediate Windows Firewall initiated for DESKTOP-SARAH456");

        let compliant = simulate(
            &data,
            &ActionRequest::RemediatePolicy { device_id: "dev-002".into(), policy_id: "pol-001".into() },
        );
        assert!(matches!(compliant, Err(ActionError::NothingToRemediate { .. })));

        // politique non affectée à l'appareil
        let unassigned = simulate(
            &data,
            &ActionRequest::RemediatePolicy { device_id: "dev-002".into(), policy_id: "pol-006".into() },
        );
        assert_eq!(unassigned, Err(ActionError::PolicyNotFound("pol-006".into())));
    }

    #[test]
    fn test_insight_actions() {
        let data = seed();
        let run = simulate(&data, &ActionRequest::RunInsight { insight_id: "insight-001".into() }).unwrap();
        assert_eq!(run.title, "Action initiated: Push firewall policy update to affected devices");
        assert_eq!(run.description.as_deref(), Some("For 4 affected devices"));

        let dismiss = simulate(&data, &ActionRequest::DismissInsight { insight_id: "insight-001".into() }).unwrap();
        assert_eq!(dismiss.title, "Marked as resolved");
        assert!(dismiss.description.is_none());
    }

    #[test]
    fn test_levels() {
        let data = seed();
        let remove = simulate(&data, &ActionRequest::RemoveDevice { device_id: "dev-001".into() }).unwrap();
        assert_eq!(remove.level, NotificationLevel::Error);
        let add = simulate(&data, &ActionRequest::AddPolicy).unwrap();
        assert_eq!(add.level, NotificationLevel::Info);
        assert_eq!(add.title, "Feature coming soon");
    }

    #[test]
    fn test_actions_never_mutate_dataset() {
        let data = seed();
        let before = data.clone();
        let requests = vec![
            ActionRequest::RestartDevice { device_id: "dev-001".into() },
            ActionRequest::RemoveDevice { device_id: "dev-003".into() },
            ActionRequest::ResolveAlert { alert_id: "alert-002".into() },
            ActionRequest::RemediatePolicy { device_id: "dev-006".into(), policy_id: "pol-004".into() },
            ActionRequest::PushPolicy { policy_id: "pol-002".into() },
            ActionRequest::BatchUpdate,
            ActionRequest::RefreshDashboard,
        ];
        for request in &requests {
            simulate(&data, request).unwrap();
        }
        // l'alerte résolue "pour de faux" reste ouverte
        assert!(simulate(&data, &ActionRequest::ResolveAlert { alert_id: "alert-002".into() }).is_ok());
        assert_eq!(data, before);
    }

    #[test]
    fn test_notification_ids_are_unique() {
        let data = seed();
        let a = simulate(&data, &ActionRequest::ExportDevices).unwrap();
        let b = simulate(&data, &ActionRequest::ExportDevices).unwrap();
        assert_ne!(a.id, b.id);
    }
}
