/*!
# Compliance Core - Modèle et agrégation de conformité des appareils

Bibliothèque sans I/O réseau utilisée par le kernel :
- Types des enregistrements (appareils, politiques, alertes, insights, rapports d'applications)
- Chargement du jeu de données via `DataSource` (seed intégré ou fichier JSON)
- `ComplianceAggregator` : filtres, statistiques et classements, fonctions pures
- Actions simulées : chaque action produit une notification, aucune donnée n'est modifiée
*/

pub mod models;
pub mod seed;
pub mod aggregator;
pub mod actions;

pub use models::*;
pub use seed::{BuiltinSeed, DataSource, JsonFileSource, SeedError};
pub use aggregator::{ComplianceAggregator, ComplianceRate, DashboardSummary, DeviceFilter, PolicyFilter, SummaryOptions};
pub use actions::{simulate, ActionError, ActionRequest, Notification, NotificationLevel};
