//! Configuration de l'application: valeurs par défaut, surchargées
//! par les variables d'environnement (et un éventuel fichier `.env`)

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use dotenv::dotenv;
use log::info;
use thiserror::Error;

use crate::consts::{LOGIN_DELAY_MS, LOG_FILE};
use crate::transitions::TransitionPolicy;

const ENV_LOGIN_DELAY: &str = "MEDIBOOK_LOGIN_DELAY_MS";
const ENV_TRANSITIONS: &str = "MEDIBOOK_TRANSITIONS";
const ENV_LOG_FILE: &str = "MEDIBOOK_LOG_FILE";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Valeur invalide pour {variable}: {value}")]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub login_delay: Duration,
    pub transitions: TransitionPolicy,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            login_delay: Duration::from_millis(LOGIN_DELAY_MS),
            transitions: TransitionPolicy::default(),
            log_file: PathBuf::from(LOG_FILE),
        }
    }
}

impl Settings {
    /// Charge `.env` s'il existe, puis lit les variables d'environnement
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Pas de latence à la connexion, transitions strictes
    pub fn for_tests() -> Self {
        Self {
            login_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(value) = lookup(ENV_LOGIN_DELAY) {
            let millis = parse(ENV_LOGIN_DELAY, &value)?;
            settings.login_delay = Duration::from_millis(millis);
        }

        if let Some(value) = lookup(ENV_TRANSITIONS) {
            settings.transitions = parse(ENV_TRANSITIONS, &value)?;
        }

        if let Some(value) = lookup(ENV_LOG_FILE) {
            settings.log_file = PathBuf::from(value);
        }

        info!("Configuration: {settings:?}");
        Ok(settings)
    }
}

fn parse<T: FromStr>(variable: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError {
        variable,
        value: value.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.login_delay, Duration::from_millis(800));
        assert_eq!(settings.transitions, TransitionPolicy::Strict);
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            (ENV_LOGIN_DELAY, "0"),
            (ENV_TRANSITIONS, "permissive"),
            (ENV_LOG_FILE, "/tmp/medibook-test.log"),
        ])
        .unwrap();

        assert_eq!(settings.login_delay, Duration::ZERO);
        assert_eq!(settings.transitions, TransitionPolicy::Permissive);
        assert_eq!(settings.log_file, PathBuf::from("/tmp/medibook-test.log"));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let error = settings_from(&[(ENV_LOGIN_DELAY, "soon")]).unwrap_err();
        assert_eq!(error.variable, ENV_LOGIN_DELAY);

        let error = settings_from(&[(ENV_TRANSITIONS, "lenient")]).unwrap_err();
        assert_eq!(error.value, "lenient");
    }
}
