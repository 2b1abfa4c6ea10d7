use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};

/// Base settings file, committed alongside the binary.
const BASE_FILE: &str = "config/Config.toml";
/// Optional machine-local JSON overrides, lowest precedence.
const LOCAL_FILE: &str = "config/Config.json";
/// Environment variables with this prefix override any file value.
const ENV_PREFIX: &str = "BAZAAR_";

/// Assembles an [`AppConfig`] from layered sources.
///
/// Precedence, highest first: environment variables, the profile file
/// (when given), the base file, then local JSON fill-ins.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the default configuration stack.
    ///
    /// # Errors
    /// Returns an error if a source cannot be read or the merged result
    /// does not deserialize into [`AppConfig`].
    pub fn load() -> Result<AppConfig> {
        Self::extract(Self::figment(None))
    }

    /// Loads the configuration stack with `config/Config.{profile}.toml`
    /// layered over the base file.
    ///
    /// # Errors
    /// Returns an error if a source cannot be read or the merged result
    /// does not deserialize into [`AppConfig`].
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        Self::extract(Self::figment(Some(profile)))
    }

    fn figment(profile: Option<&str>) -> Figment {
        let mut figment = Figment::new().merge(Toml::file(BASE_FILE));
        if let Some(profile) = profile {
            figment = figment.merge(Toml::file(format!("config/Config.{profile}.toml")));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .join(Json::file(LOCAL_FILE))
    }

    fn extract(figment: Figment) -> Result<AppConfig> {
        figment
            .extract()
            .context("invalid application configuration")
    }
}
