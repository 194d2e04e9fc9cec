use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub overview: OverviewSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataSettings {
    /// Count tables, performance tables and `bus_map.html`
    pub data_dir: PathBuf,
    /// Pre-rendered maps and chart images
    pub visualizations_dir: PathBuf,
    /// Target list produced by the scoring notebook
    pub processed_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverviewSettings {
    pub top_stops: usize,
}

impl DashboardConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("data.data_dir", "data")?
        .set_default("data.visualizations_dir", "visualizations")?
        .set_default("data.processed_dir", "data/processed")?
        .set_default("overview.top_stops", 10)?)
}

/// Defaults, then the config file, then `CLEARLANE_*` environment variables
/// (`CLEARLANE_SERVER__PORT=9000`). Without an explicit `path` the file is
/// `config/dashboard.{toml,yaml,json}` and may be absent.
pub fn load_dashboard_config(path: Option<&Path>) -> anyhow::Result<DashboardConfig> {
    let file = match path {
        Some(path) => config::File::from(path),
        None => config::File::with_name("config/dashboard").required(false),
    };
    let settings = builder()?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("CLEARLANE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
