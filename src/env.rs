use std::path::Path;

use crate::error::AppError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://onda_sonora.db";

/// Loads the profile's env files in order, later files overriding earlier
/// ones. Returns the files that were found; runs before tracing is set up,
/// so the caller logs the result.
pub fn load_environment() -> Result<Vec<&'static str>, AppError> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    let mut loaded = Vec::new();
    for env_file in env_files {
        if load_env_file(env_file)? {
            loaded.push(env_file);
        }
    }

    Ok(loaded)
}

fn load_env_file(path: &str) -> Result<bool, AppError> {
    if !Path::new(path).exists() {
        return Ok(false);
    }

    dotenvy::from_filename_override(path)
        .map_err(|e| AppError::Internal(format!("Failed to load {}: {}", path, e)))?;
    Ok(true)
}

/// Settings this service reads itself; Rocket's own `ROCKET_*` settings
/// stay with Rocket's figment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = dotenvy::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        Self { database_url }
    }
}
