use compliance_core::{BuiltinSeed, ComplianceRate, DataSource, JsonFileSource, SummaryOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct KernelConfig {
    #[serde(default)]
    pub http: HttpConf,
    #[serde(default)]
    pub data: DataConf,
    #[serde(default)]
    pub summary: SummaryConf,
    #[serde(default)]
    pub notifications: NotificationsConf,
    pub mqtt: Option<MqttConf>,
    // lu depuis COMPLIANCE_API_KEY, jamais depuis le YAML
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConf {
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DataConf {
    pub seed_file: Option<PathBuf>, // ex: "./data/inventory.json", sinon seed intégré
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SummaryConf {
    pub top_policies: usize,
    pub fixed_compliance_rate: Option<u8>, // 70 pour reproduire l'ancien dashboard
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationsConf {
    pub capacity: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConf {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl Default for SummaryConf {
    fn default() -> Self {
        Self { top_policies: 3, fixed_compliance_rate: None }
    }
}

impl Default for NotificationsConf {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

impl Default for MqttConf {
    fn default() -> Self {
        Self { host: "localhost".into(), port: 1883 }
    }
}

impl KernelConfig {
    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            top_policies: self.summary.top_policies,
            compliance_rate: match self.summary.fixed_compliance_rate {
                Some(rate) => ComplianceRate::Fixed(rate),
                None => ComplianceRate::Computed,
            },
        }
    }

    pub fn data_source(&self) -> Box<dyn DataSource + Send + Sync> {
        match &self.data.seed_file {
            Some(path) => Box::new(JsonFileSource::new(path.clone())),
            None => Box::new(BuiltinSeed),
        }
    }
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var("COMPLIANCE_KERNEL_CONFIG").unwrap_or_else(|_| "kernel.yaml".into());
    let mut cfg = load_config_from(&path).await;
    cfg.api_key = std::env::var("COMPLIANCE_API_KEY").ok().filter(|k| !k.is_empty());
    cfg
}

pub async fn load_config_from<P: AsRef<Path>>(path: P) -> KernelConfig {
    let path = path.as_ref();
    if path.exists() {
        let txt = fs::read_to_string(path).await.unwrap_or_default();
        if txt.trim().is_empty() { return KernelConfig::default(); }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            warn!("[kernel] invalid config {}: {e}", path.display());
            KernelConfig::default()
        })
    } else {
        info!("[kernel] no {}, using default config", path.display());
        KernelConfig::default()
    }
}
