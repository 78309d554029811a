use std::time::Duration;

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::harvest_plan::{FailurePolicy, HarvestPlan, Timeouts, Viewport};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub webdriver: WebDriverSettings,
    pub catalog: CatalogSettings,
    pub timeouts: TimeoutSettings,
    pub output: OutputSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct WebDriverSettings {
    pub server_url: String,
    pub headless: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CatalogSettings {
    pub url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub entry_count: usize,
    pub viewport: ViewportSettings,
    pub placeholder_email: String,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ViewportSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub height: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct TimeoutSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub element_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub locator_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub poll_interval_ms: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct OutputSettings {
    pub directory: String,
    pub file_name: String,
    #[serde(default)]
    pub transfer: TransferSettings,
}

/// Optional copy of every harvested bundle into local storage.
#[derive(Deserialize, Clone, Debug)]
pub struct TransferSettings {
    pub enabled: bool,
    pub directory: String,
    pub prefix: String,
}

impl Default for TransferSettings {
    fn default() -> Self {
        TransferSettings {
            enabled: false,
            directory: "bundles".to_string(),
            prefix: String::new(),
        }
    }
}

impl TimeoutSettings {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            element: Duration::from_millis(self.element_ms),
            locator: Duration::from_millis(self.locator_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

impl Settings {
    pub fn harvest_plan(&self) -> HarvestPlan {
        HarvestPlan {
            catalog_url: self.catalog.url.clone(),
            entry_count: self.catalog.entry_count,
            viewport: Viewport {
                width: self.catalog.viewport.width,
                height: self.catalog.viewport.height,
            },
            placeholder_email: self.catalog.placeholder_email.clone(),
            failure_policy: self.catalog.failure_policy,
            timeouts: self.timeouts.timeouts(),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Failed to read current dir: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // APP_CATALOG__ENTRY_COUNT=3 sets `Settings.catalog.entry_count`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
