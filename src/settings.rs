use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const ENV_PREFIX: &str = "PLANTS";
const SETTINGS_FILE: &str = "plants";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Postgrest,
}

#[derive(Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_store")]
    pub store: StoreBackend,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    pub postgrest_url: Option<String>,
    pub postgrest_key: Option<String>,
    pub admin_password: Option<String>,
    #[serde(default = "default_base_origin")]
    pub base_origin: String,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_upload_preset: Option<String>,
    #[serde(default = "default_cloudinary_folder")]
    pub cloudinary_folder: String,
    #[serde(default = "default_cloudinary_api_base")]
    pub cloudinary_api_base: String,
}

fn default_store() -> StoreBackend {
    StoreBackend::Sqlite
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/plants.sqlite")
}

fn default_base_origin() -> String {
    "http://localhost:3000".into()
}

fn default_cloudinary_folder() -> String {
    "plants".into()
}

fn default_cloudinary_api_base() -> String {
    "https://api.cloudinary.com".into()
}

impl Settings {
    /// `plants.toml` (optional) overridden by `PLANTS_*` environment variables.
    pub fn load() -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::with_name(SETTINGS_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read settings")?;
        Self::from_config(cfg)
    }

    fn from_config(cfg: Config) -> Result<Self> {
        let settings: Settings = cfg.try_deserialize().context("Invalid settings")?;
        settings.check()?;
        Ok(settings)
    }

    #[cfg(test)]
    fn from_toml(text: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::from_str(text, config::FileFormat::Toml))
            .build()?;
        Self::from_config(cfg)
    }

    fn check(&self) -> Result<()> {
        if self.store == StoreBackend::Postgrest
            && (self.postgrest_url.is_none() || self.postgrest_key.is_none())
        {
            bail!("store = postgrest needs postgrest_url and postgrest_key");
        }
        Ok(())
    }

    /// Upload preset and cloud name, when image uploads are configured.
    pub fn cloudinary(&self) -> Option<(&str, &str)> {
        Some((
            self.cloudinary_cloud_name.as_deref()?,
            self.cloudinary_upload_preset.as_deref()?,
        ))
    }
}

fn redact(secret: &Option<String>) -> &'static str {
    if secret.is_some() {
        "<set>"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("store", &self.store)
            .field("db_path", &self.db_path)
            .field("postgrest_url", &self.postgrest_url)
            .field("postgrest_key", &redact(&self.postgrest_key))
            .field("admin_password", &redact(&self.admin_password))
            .field("base_origin", &self.base_origin)
            .field("cloudinary_cloud_name", &self.cloudinary_cloud_name)
            .field("cloudinary_upload_preset", &self.cloudinary_upload_preset)
            .field("cloudinary_folder", &self.cloudinary_folder)
            .field("cloudinary_api_base", &self.cloudinary_api_base)
            .finish()
    }
}
