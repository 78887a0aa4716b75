use serde::Deserialize;
use std::{collections::HashMap, env, error::Error, fmt, fs, path::Path};

const DEFAULT_BACK_SYMBOL: &str = "0";
const DEFAULT_HOME_SYMBOL: &str = "00";
const DEFAULT_INVALID_INPUT: &str = "CON Invalid input\n{menu}";

const CONFIG_FILE_VAR: &str = "PALAVER_CONFIG_FILE";
const DEFAULT_CONFIG_FILE: &str = "palaver.yaml";
const ENVIRONMENT_VAR: &str = "PALAVER_ENV";
const DEFAULT_ENVIRONMENT: &str = "development";

/// Engine configuration
///
/// Carries the navigation tokens and the per language strings used when
/// re-displaying a menu after invalid input.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    back_symbol: String,
    home_symbol: String,
    strings: Strings,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct Strings {
    invalid_input: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            back_symbol: DEFAULT_BACK_SYMBOL.to_string(),
            home_symbol: DEFAULT_HOME_SYMBOL.to_string(),
            strings: Strings::default(),
        }
    }
}

impl Config {
    /// Creates a configuration with the default symbols
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the configuration for one environment from a YAML file
    ///
    /// The file maps environment names to configuration sections:
    ///
    /// ```yaml
    /// development:
    ///   back_symbol: "0"
    ///   home_symbol: "00"
    ///   strings:
    ///     invalid_input:
    ///       en: "CON Invalid input\n{menu}"
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P, environment: &str) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(ConfigError::Io)?;
        let mut environments: HashMap<String, Config> =
            serde_yaml::from_str(&raw).map_err(ConfigError::Yaml)?;
        environments
            .remove(environment)
            .ok_or_else(|| ConfigError::UnknownEnvironment(environment.to_string()))
    }

    /// Loads the configuration selected by environment variables
    ///
    /// The file path is taken from `PALAVER_CONFIG_FILE` (default
    /// `palaver.yaml`) and the environment name from `PALAVER_ENV`
    /// (default `development`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let environment =
            env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string());
        Self::from_file(path, &environment)
    }

    /// Sets the token meaning "go back one step"
    pub fn back_symbol<S: Into<String>>(mut self, symbol: S) -> Self {
        self.back_symbol = symbol.into();
        self
    }

    /// Sets the token meaning "return to the root"
    pub fn home_symbol<S: Into<String>>(mut self, symbol: S) -> Self {
        self.home_symbol = symbol.into();
        self
    }

    /// Sets the invalid input template for a language
    ///
    /// The template's `{menu}` placeholder receives the re-displayed menu.
    pub fn invalid_input_string<L, S>(mut self, lang: L, template: S) -> Self
    where
        L: Into<String>,
        S: Into<String>,
    {
        self.strings.invalid_input.insert(lang.into(), template.into());
        self
    }

    /// Returns the back token
    pub fn get_back_symbol(&self) -> &str {
        &self.back_symbol
    }

    /// Returns the home token
    pub fn get_home_symbol(&self) -> &str {
        &self.home_symbol
    }

    /// Returns the invalid input template for a language, falling through to
    /// the built-in template
    pub(crate) fn get_invalid_input(&self, lang: Option<&str>) -> &str {
        lang.and_then(|lang| self.strings.invalid_input.get(lang))
            .map(String::as_str)
            .unwrap_or(DEFAULT_INVALID_INPUT)
    }
}

/// An error returned when loading configuration
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read
    Io(std::io::Error),
    /// The file is not valid YAML
    Yaml(serde_yaml::Error),
    /// The selected environment has no section in the file
    UnknownEnvironment(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(out, "failed to read configuration: {}", err),
            ConfigError::Yaml(err) => write!(out, "failed to parse configuration: {}", err),
            ConfigError::UnknownEnvironment(environment) => {
                write!(out, "no configuration for environment '{}'", environment)
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Yaml(err) => Some(err),
            ConfigError::UnknownEnvironment(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = Config::new();
        assert_eq!(config.get_back_symbol(), "0");
        assert_eq!(config.get_home_symbol(), "00");
        assert_eq!(
            config.get_invalid_input(None),
            "CON Invalid input\n{menu}"
        );
    }

    #[test]
    fn invalid_input_resolution() {
        let config = Config::new().invalid_input_string("sw", "CON Chaguo batili\n{menu}");
        assert_eq!(
            config.get_invalid_input(Some("sw")),
            "CON Chaguo batili\n{menu}"
        );
        assert_eq!(
            config.get_invalid_input(Some("en")),
            "CON Invalid input\n{menu}"
        );
        assert_eq!(config.get_invalid_input(None), "CON Invalid input\n{menu}");
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("palaver.yaml");
        let mut file = fs::File::create(&path).expect("Failed to create config file");
        file.write_all(
            concat!(
                "development:\n",
                "  back_symbol: \"9\"\n",
                "production:\n",
                "  home_symbol: \"99\"\n",
                "  strings:\n",
                "    invalid_input:\n",
                "      en: \"CON Try again\\n{menu}\"\n",
            )
            .as_bytes(),
        )
        .expect("Failed to write config file");

        let development = Config::from_file(&path, "development").unwrap();
        assert_eq!(development.get_back_symbol(), "9");
        assert_eq!(development.get_home_symbol(), "00");

        let production = Config::from_file(&path, "production").unwrap();
        assert_eq!(production.get_home_symbol(), "99");
        assert_eq!(
            production.get_invalid_input(Some("en")),
            "CON Try again\n{menu}"
        );

        assert!(Config::from_file(&path, "staging").is_err());
    }
}
