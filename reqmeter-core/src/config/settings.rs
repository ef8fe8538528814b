use super::model::MetricsConfig;
use super::option::MetricsOption;
use serde::{Deserialize, Serialize};

/// Settings read from the TOML configuration file
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerSettings {
    /// 服务名，作为 http.server_name 属性
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Serializable counterpart of the metric toggles in [`MetricsConfig`]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct MetricsSettings {
    #[serde(default = "default_true")]
    pub record_in_flight: bool,
    #[serde(default = "default_true")]
    pub record_duration: bool,
    #[serde(default = "default_true")]
    pub record_size: bool,
    #[serde(default = "default_true")]
    pub grouped_status: bool,
    /// Path of the Prometheus exposition endpoint
    #[serde(default = "default_metrics_path")]
    pub path: String,
    /// Prefix of every exported metric name
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            record_in_flight: true,
            record_duration: true,
            record_size: true,
            grouped_status: true,
            path: default_metrics_path(),
            namespace: default_namespace(),
        }
    }
}

impl Settings {
    /// 验证配置的有效性
    pub fn validate(&self) -> anyhow::Result<()> {
        self.metrics.validate()
    }
}

impl MetricsSettings {
    /// 指标路径必须以 `/` 开头，否则无法注册路由
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.path.starts_with('/') {
            anyhow::bail!("Invalid metrics path '{}': must start with '/'", self.path);
        }
        Ok(())
    }

    /// Options turning off every metric disabled in the file.
    pub fn options(&self) -> Vec<MetricsOption> {
        let mut options = Vec::new();
        if !self.record_in_flight {
            options.push(MetricsOption::with_record_in_flight_disabled(false));
        }
        if !self.record_duration {
            options.push(MetricsOption::with_record_duration_disabled(false));
        }
        if !self.record_size {
            options.push(MetricsOption::with_record_size_disabled(false));
        }
        if !self.grouped_status {
            options.push(MetricsOption::with_grouped_status_disabled());
        }
        options
    }

    /// Build a [`MetricsConfig`] with default attributes and no recorder.
    pub fn to_config(&self) -> MetricsConfig {
        MetricsConfig::with_options(self.options())
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_server_name() -> String {
    "reqmeter".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_namespace() -> String {
    "http_server".to_string()
}
