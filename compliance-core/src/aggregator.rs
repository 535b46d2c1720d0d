/**
 * COMPLIANCE AGGREGATOR - Vues dérivées du parc d'appareils
 *
 * RÔLE :
 * Calcul des vues du dashboard à partir des enregistrements bruts :
 * tableaux filtrés, cartes de statistiques, données de graphiques, classements.
 *
 * FONCTIONNEMENT :
 * - Fonctions pures : entrées empruntées, aucune mutation, aucun I/O
 * - Fonctions totales : collection vide => résultat vide, jamais d'erreur
 * - Filtres : ET logique des filtres actifs, ordre d'origine conservé
 * - Classements : tri stable, les ex-aequo gardent l'ordre d'origine
 *
 * UTILITÉ :
 * 🎯 Dashboard : DashboardSummary + graphique de conformité + insights
 * 🎯 Pages Devices/Policies : recherche texte + filtres énumérés
 * 🎯 Détail appareil : jointure politiques (références orphelines tolérées)
 */

use crate::models::{
    Alert, AppInstallStatus, Application, Choice, ComplianceStatus, Dataset, Device, DeviceType,
    InstallState, Insight, OsType, Policy, PolicyType, Severity,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const UNRESOLVED_POLICY_NAME: &str = "Unknown policy";

const NON_COMPLIANT_HINTS: &[&str] = &[
    "Restart the device to apply pending updates",
    "Refresh policy assignments",
    "Contact user for assistance",
];

/// Filtres de la page Devices (query string: search, status, type, os)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Choice<ComplianceStatus>,
    #[serde(default, rename = "type")]
    pub device_type: Choice<DeviceType>,
    #[serde(default)]
    pub os: Choice<OsType>,
}

/// Filtres de la page Policies (query string: search, type)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, rename = "type")]
    pub policy_type: Choice<PolicyType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStats {
    pub total: usize,
    pub compliant: usize,
    pub non_compliant: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRank {
    pub id: String,
    pub name: String,
    pub affected_devices: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub device_stats: DeviceStats,
    pub compliance_rate: u8,
    pub critical_alerts: usize,
    pub os_distribution: BTreeMap<OsType, usize>,
    pub device_type_distribution: BTreeMap<DeviceType, usize>,
    pub top_non_compliant_policies: Vec<PolicyRank>,
}

/// Mode de calcul du taux de conformité global
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComplianceRate {
    /// compliant / total, arrondi
    #[default]
    Computed,
    /// Valeur affichée telle quelle (compatibilité avec l'ancien dashboard : 70)
    Fixed(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    pub top_policies: usize,
    pub compliance_rate: ComplianceRate,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self { top_policies: 3, compliance_rate: ComplianceRate::Computed }
    }
}

/// Politique d'un appareil après jointure avec le catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePolicyView {
    pub policy_id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub policy_type: Option<PolicyType>,
    pub status: ComplianceStatus,
    pub resolved: bool,
    pub remediable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetail {
    pub device: Device,
    pub policies: Vec<DevicePolicyView>,
    pub alerts: Vec<Alert>,
    pub remediation_hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSlice {
    pub name: &'static str,
    pub value: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallBreakdown {
    pub total: usize,
    pub by_state: BTreeMap<InstallState, usize>,
}

fn matches_search(term: Option<&str>, fields: &[&str]) -> bool {
    let Some(term) = term.filter(|t| !t.is_empty()) else { return true };
    let needle = term.to_lowercase();
    fields.iter().any(|field| field.to_lowercase().contains(&needle))
}

/// Sous-séquence des appareils qui satisfont tous les filtres actifs
pub fn filter_devices<'a>(devices: &'a [Device], filter: &DeviceFilter) -> Vec<&'a Device> {
    devices
        .iter()
        .filter(|d| matches_search(filter.search.as_deref(), &[d.name.as_str(), d.owner.as_str()]))
        .filter(|d| filter.status.admits(&d.compliance_status))
        .filter(|d| filter.device_type.admits(&d.device_type))
        .filter(|d| filter.os.admits(&d.os))
        .collect()
}

pub fn filter_policies<'a>(policies: &'a [Policy], filter: &PolicyFilter) -> Vec<&'a Policy> {
    policies
        .iter()
        .filter(|p| matches_search(filter.search.as_deref(), &[p.name.as_str(), p.description.as_str()]))
        .filter(|p| filter.policy_type.admits(&p.policy_type))
        .collect()
}

/// Tri stable par nombre d'appareils affectés décroissant, puis les n premiers
pub fn rank_top_policies(policies: &[Policy], n: usize) -> Vec<&Policy> {
    rank_policy_refs(policies.iter().collect(), n)
}

// tri stable : à égalité, l'ordre d'origine est conservé
fn rank_policy_refs(mut ranked: Vec<&Policy>, n: usize) -> Vec<&Policy> {
    ranked.sort_by(|a, b| b.affected_devices.cmp(&a.affected_devices));
    ranked.truncate(n);
    ranked
}

pub fn compute_summary(
    devices: &[Device],
    policies: &[Policy],
    alerts: &[Alert],
    options: &SummaryOptions,
) -> DashboardSummary {
    let mut stats = DeviceStats { total: devices.len(), compliant: 0, non_compliant: 0, unknown: 0 };
    let mut os_distribution: BTreeMap<OsType, usize> = OsType::ALL.iter().map(|os| (*os, 0)).collect();
    let mut device_type_distribution: BTreeMap<DeviceType, usize> =
        DeviceType::ALL.iter().map(|t| (*t, 0)).collect();

    for device in devices {
        match device.compliance_status {
            ComplianceStatus::Compliant => stats.compliant += 1,
            ComplianceStatus::NonCompliant => stats.non_compliant += 1,
            ComplianceStatus::Unknown => stats.unknown += 1,
        }
        *os_distribution.entry(device.os).or_insert(0) += 1;
        *device_type_distribution.entry(device.device_type).or_insert(0) += 1;
    }

    let compliance_rate = match options.compliance_rate {
        ComplianceRate::Fixed(rate) => rate.min(100),
        ComplianceRate::Computed => computed_rate(&stats),
    };

    let critical_alerts = alerts.iter().filter(|a| a.severity == Severity::Critical).count();

    // Seules les politiques pas entièrement respectées sont candidates
    let non_compliant: Vec<&Policy> = policies.iter().filter(|p| p.compliance_rate < 100).collect();
    let top_non_compliant_policies = rank_policy_refs(non_compliant, options.top_policies)
        .into_iter()
        .map(|p| PolicyRank { id: p.id.clone(), name: p.name.clone(), affected_devices: p.affected_devices })
        .collect();

    DashboardSummary {
        device_stats: stats,
        compliance_rate,
        critical_alerts,
        os_distribution,
        device_type_distribution,
        top_non_compliant_policies,
    }
}

fn computed_rate(stats: &DeviceStats) -> u8 {
    if stats.total == 0 {
        return 0;
    }
    ((stats.compliant as f64 / stats.total as f64) * 100.0).round() as u8
}

/// Jointure des politiques d'un appareil avec le catalogue.
/// Une référence inconnue donne une entrée `resolved: false` au statut `unknown`.
pub fn resolve_device_policies(device: &Device, policies: &[Policy]) -> Vec<DevicePolicyView> {
    device
        .policies
        .iter()
        .map(|assignment| match policies.iter().find(|p| p.id == assignment.policy_id) {
            Some(policy) => DevicePolicyView {
                policy_id: policy.id.clone(),
                name: policy.name.clone(),
                description: policy.description.clone(),
                policy_type: Some(policy.policy_type),
                status: assignment.status,
                resolved: true,
                remediable: assignment.status != ComplianceStatus::Compliant,
            },
            None => DevicePolicyView {
                policy_id: assignment.policy_id.clone(),
                name: UNRESOLVED_POLICY_NAME.to_string(),
                description: String::new(),
                policy_type: None,
                status: ComplianceStatus::Unknown,
                resolved: false,
                remediable: false,
            },
        })
        .collect()
}

pub fn find_device<'a>(devices: &'a [Device], id: &str) -> Option<&'a Device> {
    devices.iter().find(|d| d.id == id)
}

pub fn alerts_for_device<'a>(alerts: &'a [Alert], device_id: &str) -> Vec<&'a Alert> {
    alerts.iter().filter(|a| a.device_id == device_id).collect()
}

pub fn remediation_hints(status: ComplianceStatus) -> &'static [&'static str] {
    match status {
        ComplianceStatus::NonCompliant => NON_COMPLIANT_HINTS,
        ComplianceStatus::Compliant | ComplianceStatus::Unknown => &[],
    }
}

pub fn device_detail(dataset: &Dataset, id: &str) -> Option<DeviceDetail> {
    let device = find_device(&dataset.devices, id)?;
    Some(DeviceDetail {
        device: device.clone(),
        policies: resolve_device_policies(device, &dataset.policies),
        alerts: alerts_for_device(&dataset.alerts, &device.id).into_iter().cloned().collect(),
        remediation_hints: remediation_hints(device.compliance_status).iter().map(|h| h.to_string()).collect(),
    })
}

pub fn compliance_chart(stats: &DeviceStats) -> Vec<ChartSlice> {
    vec![
        ChartSlice { name: "Compliant", value: stats.compliant, color: "#0AB727" },
        ChartSlice { name: "Non-Compliant", value: stats.non_compliant, color: "#D13438" },
        ChartSlice { name: "Unknown", value: stats.unknown, color: "#8A8886" },
    ]
}

pub fn featured_insights(insights: &[Insight], n: usize) -> &[Insight] {
    &insights[..n.min(insights.len())]
}

pub fn filter_applications<'a>(applications: &'a [Application], search: Option<&str>) -> Vec<&'a Application> {
    applications
        .iter()
        .filter(|a| matches_search(search, &[a.name.as_str(), a.publisher.as_str(), a.platform.as_str(), a.category.as_str()]))
        .collect()
}

pub fn install_statuses<'a>(statuses: &'a [AppInstallStatus], application_id: &str) -> Vec<&'a AppInstallStatus> {
    statuses.iter().filter(|s| s.application_id == application_id).collect()
}

pub fn install_breakdown<'a>(statuses: impl IntoIterator<Item = &'a AppInstallStatus>) -> InstallBreakdown {
    let mut by_state: BTreeMap<InstallState, usize> = InstallState::ALL.iter().map(|s| (*s, 0)).collect();
    let mut total = 0;
    for status in statuses {
        *by_state.entry(status.install_state).or_insert(0) += 1;
        total += 1;
    }
    InstallBreakdown { total, by_state }
}

/// Point d'accès partagé aux vues dérivées d'un jeu de données immuable.
/// Clonable à faible coût (Arc), utilisable depuis n'importe quel thread sans verrou.
#[derive(Debug, Clone)]
pub struct ComplianceAggregator {
    dataset: Arc<Dataset>,
    options: SummaryOptions,
}

impl ComplianceAggregator {
    pub fn new(dataset: Dataset, options: SummaryOptions) -> Self {
        Self { dataset: Arc::new(dataset), options }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn options(&self) -> &SummaryOptions {
        &self.options
    }

    pub fn devices(&self, filter: &DeviceFilter) -> Vec<&Device> {
        filter_devices(&self.dataset.devices, filter)
    }

    pub fn policies(&self, filter: &PolicyFilter) -> Vec<&Policy> {
        filter_policies(&self.dataset.policies, filter)
    }

    pub fn top_policies(&self, n: usize) -> Vec<&Policy> {
        rank_top_policies(&self.dataset.policies, n)
    }

    pub fn summary(&self) -> DashboardSummary {
        compute_summary(&self.dataset.devices, &self.dataset.policies, &self.dataset.alerts, &self.options)
    }

    pub fn device_detail(&self, id: &str) -> Option<DeviceDetail> {
        device_detail(&self.dataset, id)
    }

    pub fn applications(&self, search: Option<&str>) -> Vec<&Application> {
        filter_applications(&self.dataset.applications, search)
    }

    pub fn application(&self, id: &str) -> Option<&Application> {
        self.dataset.applications.iter().find(|a| a.id == id)
    }

    pub fn install_statuses(&self, application_id: &str) -> Vec<&AppInstallStatus> {
        install_statuses(&self.dataset.install_statuses, application_id)
    }
}
