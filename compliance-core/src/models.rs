/**
 * MODÈLES - Enregistrements du parc d'appareils et de leurs politiques
 *
 * RÔLE : Types valeur immuables chargés au démarrage (devices, policies,
 * alerts, insights, rapports d'installation d'applications).
 *
 * FORMAT : JSON camelCase, identique au format du dashboard web.
 * Les champs énumérés sont des enums fermés : une valeur inconnue est
 * rejetée au chargement plutôt que traitée comme un défaut silencieux.
 */

use serde::de::{Deserializer, IntoDeserializer};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, PrimitiveDateTime};

// Horodatages du seed : heure locale sans fuseau (ex: "2023-11-04T14:30:00")
time::serde::format_description!(
    local_timestamp,
    PrimitiveDateTime,
    "[year]-[month]-[day]T[hour]:[minute]:[second]"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Laptop,
    Mobile,
    Tablet,
}

impl DeviceType {
    pub const ALL: [DeviceType; 4] = [Self::Desktop, Self::Laptop, Self::Mobile, Self::Tablet];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OsType {
    Windows,
    #[serde(rename = "MacOS")]
    MacOs,
    #[serde(rename = "iOS")]
    Ios,
    Android,
}

impl OsType {
    pub const ALL: [OsType; 4] = [Self::Windows, Self::MacOs, Self::Ios, Self::Android];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    Encryption,
    Firewall,
    Antivirus,
    Updates,
    Password,
    App,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Restart,
    Update,
    Reinstall,
    Notify,
}

/// État d'installation d'une application sur un appareil (rapports)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InstallState {
    Installed,
    Failed,
    Installing,
    Available,
}

impl InstallState {
    pub const ALL: [InstallState; 4] = [Self::Installed, Self::Failed, Self::Installing, Self::Available];
}

/// Affectation d'une politique à un appareil avec le statut remonté par l'appareil
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAssignment {
    pub policy_id: String,
    pub status: ComplianceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub os: OsType,
    pub os_version: String,
    #[serde(with = "local_timestamp")]
    pub last_seen: PrimitiveDateTime,
    pub compliance_status: ComplianceStatus,
    pub owner: String,
    pub department: String,
    pub policies: Vec<PolicyAssignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
    /// Pourcentage 0..=100, pré-calculé par la source (pas dérivé des appareils)
    pub compliance_rate: u8,
    pub affected_devices: u32,
    #[serde(with = "local_timestamp")]
    pub created_at: PrimitiveDateTime,
    #[serde(with = "local_timestamp")]
    pub updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub device_id: String,
    pub device_name: String,
    pub message: String,
    #[serde(with = "local_timestamp")]
    pub timestamp: PrimitiveDateTime,
    pub severity: Severity,
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    pub title: String,
    pub description: String,
    pub device_count: u32,
    pub recommended_action: String,
    pub action_type: ActionType,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub name: String,
    pub publisher: String,
    pub platform: String,
    #[serde(rename = "type")]
    pub category: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInstallStatus {
    pub device_id: String,
    pub application_id: String,
    pub device_name: String,
    pub user_principal_name: String,
    pub username: String,
    pub platform: String,
    pub app_version: String,
    pub error_code: String,
    pub hex_error_code: String,
    pub install_state: InstallState,
    pub install_state_details: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified_time: OffsetDateTime,
    pub install_count: u32,
}

/// Jeu de données complet, immuable une fois chargé
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub devices: Vec<Device>,
    pub policies: Vec<Policy>,
    pub alerts: Vec<Alert>,
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub install_statuses: Vec<AppInstallStatus>,
}

/// Sélection d'un filtre énuméré : "all" ou une valeur exacte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T: PartialEq> Choice<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(expected) => expected == value,
        }
    }
}

// "all" (ou vide) => All, sinon la valeur wire de l'enum
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Choice<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Ok(Choice::All);
        }
        let inner = <String as IntoDeserializer<'de, D::Error>>::into_deserializer(raw);
        T::deserialize(inner).map(Choice::Only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&ComplianceStatus::NonCompliant).unwrap(), "\"non-compliant\"");
        assert_eq!(serde_json::to_string(&OsType::MacOs).unwrap(), "\"MacOS\"");
        assert_eq!(serde_json::to_string(&OsType::Ios).unwrap(), "\"iOS\"");
        assert_eq!(serde_json::to_string(&DeviceType::Tablet).unwrap(), "\"tablet\"");
        assert_eq!(serde_json::to_string(&InstallState::Installing).unwrap(), "\"Installing\"");
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        let err = serde_json::from_str::<PolicyType>("\"vpn\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_choice_parsing() {
        let all: Choice<DeviceType> = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, Choice::All);
        let empty: Choice<DeviceType> = serde_json::from_str("\"\"").unwrap();
        assert_eq!(empty, Choice::All);
        let laptop: Choice<DeviceType> = serde_json::from_str("\"laptop\"").unwrap();
        assert_eq!(laptop, Choice::Only(DeviceType::Laptop));
        let status: Choice<ComplianceStatus> = serde_json::from_str("\"non-compliant\"").unwrap();
        assert!(status.admits(&ComplianceStatus::NonCompliant));
        assert!(!status.admits(&ComplianceStatus::Compliant));
        assert!(serde_json::from_str::<Choice<OsType>>("\"Linux\"").is_err());
    }

    #[test]
    fn test_device_timestamp_format() {
        let json = r#"{
            "id": "dev-x", "name": "X", "type": "laptop", "os": "Windows",
            "osVersion": "11", "lastSeen": "2023-11-04T14:30:00",
            "complianceStatus": "unknown", "owner": "O", "department": "D",
            "policies": [{"policyId": "pol-001", "status": "compliant"}]
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.last_seen.hour(), 14);
        assert_eq!(device.policies.len(), 1);

        let back = serde_json::to_value(&device).unwrap();
        assert_eq!(back["lastSeen"], "2023-11-04T14:30:00");
        assert_eq!(back["type"], "laptop");
    }
}
