/**
 * SEED - Sources du jeu de données de conformité
 *
 * RÔLE :
 * Frontière de chargement : c'est ici (et seulement ici) que les enregistrements
 * sont validés. L'agrégateur suppose des données déjà contrôlées.
 *
 * FONCTIONNEMENT :
 * - DataSource trait = interface commune (load + describe)
 * - BuiltinSeed = inventaire JSON embarqué dans le binaire
 * - JsonFileSource = même format, lu depuis le disque
 * - Validation : IDs dupliqués => erreur ; références orphelines => warning
 */

use crate::models::Dataset;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

const BUILTIN_INVENTORY: &str = include_str!("../seed/inventory.json");

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid inventory JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate {collection} id: {id}")]
    DuplicateId { collection: &'static str, id: String },
}

/// Interface commune des sources de données
/// Permet de remplacer le seed statique par une autre source sans toucher à l'agrégation
pub trait DataSource {
    fn load(&self) -> Result<Dataset, SeedError>;

    /// Description lisible de la source (pour les logs)
    fn describe(&self) -> String;
}

/// Inventaire de démonstration embarqué (10 appareils, 6 politiques...)
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSeed;

impl DataSource for BuiltinSeed {
    fn load(&self) -> Result<Dataset, SeedError> {
        parse_inventory(BUILTIN_INVENTORY)
    }

    fn describe(&self) -> String {
        "builtin seed".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for JsonFileSource {
    fn load(&self) -> Result<Dataset, SeedError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| SeedError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_inventory(&content)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Parse + validation d'un inventaire JSON
pub fn parse_inventory(content: &str) -> Result<Dataset, SeedError> {
    let dataset: Dataset = serde_json::from_str(content)?;
    validate(&dataset)?;
    info!(
        "[seed] loaded {} devices, {} policies, {} alerts, {} insights, {} applications",
        dataset.devices.len(),
        dataset.policies.len(),
        dataset.alerts.len(),
        dataset.insights.len(),
        dataset.applications.len()
    );
    Ok(dataset)
}

fn validate(dataset: &Dataset) -> Result<(), SeedError> {
    ensure_unique("device", dataset.devices.iter().map(|d| d.id.as_str()))?;
    ensure_unique("policy", dataset.policies.iter().map(|p| p.id.as_str()))?;
    ensure_unique("alert", dataset.alerts.iter().map(|a| a.id.as_str()))?;
    ensure_unique("insight", dataset.insights.iter().map(|i| i.id.as_str()))?;
    ensure_unique("application", dataset.applications.iter().map(|a| a.id.as_str()))?;

    // Références orphelines : tolérées, l'agrégateur les marque "unresolved"
    let policy_ids: HashSet<&str> = dataset.policies.iter().map(|p| p.id.as_str()).collect();
    for device in &dataset.devices {
        for assignment in &device.policies {
            if !policy_ids.contains(assignment.policy_id.as_str()) {
                warn!("[seed] device {} references unknown policy {}", device.id, assignment.policy_id);
            }
        }
    }

    let device_ids: HashSet<&str> = dataset.devices.iter().map(|d| d.id.as_str()).collect();
    for alert in &dataset.alerts {
        if !device_ids.contains(alert.device_id.as_str()) {
            warn!("[seed] alert {} references unknown device {}", alert.id, alert.device_id);
        }
    }

    Ok(())
}

fn ensure_unique<'a>(collection: &'static str, ids: impl Iterator<Item = &'a str>) -> Result<(), SeedError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SeedError::DuplicateId { collection, id: id.to_string() });
        }
    }
    Ok(())
}
