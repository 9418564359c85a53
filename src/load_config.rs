use crate::config::ClientConfig;
use crate::invoice::InvoiceJob;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::Result;
use serde::Deserialize;
use tracing::{info, error};

#[derive(Deserialize)]
struct StaticConfig {
    #[serde(default)]
    api: ApiSection,
    #[serde(default)]
    render: RenderSection,
    invoice: InvoiceJob,
}

#[derive(Deserialize, Default)]
struct ApiSection {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

#[derive(Deserialize)]
struct RenderSection {
    #[serde(default = "default_template_dir")]
    template_dir: PathBuf,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self { template_dir: default_template_dir() }
    }
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

/// Everything the `invoice` command needs: client credentials, where the
/// templates live, and the job itself.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub template_dir: PathBuf,
    pub invoice: InvoiceJob,
}

/// Loads a static YAML job file (no secrets) and injects the credentials from env.
///
/// `api.base_url` in the file takes precedence over `CUBIC_BASE_URL`, and
/// `api.timeout_secs` over `CUBIC_TIMEOUT_SECS`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        },
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        },
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let mut client = match ClientConfig::from_env(static_conf.api.base_url.as_deref()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to load client credentials from env");
            return Err(e);
        }
    };
    if let Some(secs) = static_conf.api.timeout_secs {
        info!(timeout_secs = secs, "Using request timeout from config file");
        client = client.with_timeout(Duration::from_secs(secs));
    }

    let config = AppConfig {
        client,
        template_dir: static_conf.render.template_dir,
        invoice: static_conf.invoice,
    };

    info!(
        template_dir = %config.template_dir.display(),
        "Configuration loaded and merged successfully"
    );
    config.invoice.trace_loaded();

    Ok(config)
}
