use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::IndexError;

/// Project-relative location of the config file.
pub const PROJECT_CONFIG_PATH: &str = ".frindex/config.toml";

/// Project-relative default location of the index database.
pub const DEFAULT_DATABASE_PATH: &str = ".frindex/index.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub years: YearsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearsConfig {
    #[serde(default = "default_min_year")]
    pub min: i32,
    /// Defaults to the current calendar year when unset.
    #[serde(default)]
    pub max: Option<i32>,
}

impl Default for YearsConfig {
    fn default() -> Self {
        Self {
            min: default_min_year(),
            max: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Load config from `.frindex/config.toml` under `project_root`, falling back
/// to the user config directory and then to defaults.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load_config(project_root: &Path) -> Result<IndexConfig> {
    load_config_with(project_root, user_config_path().as_deref())
}

/// [`load_config`] with an explicit user config file.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load_config_with(project_root: &Path, user_config: Option<&Path>) -> Result<IndexConfig> {
    let project_path = project_root.join(PROJECT_CONFIG_PATH);
    if project_path.exists() {
        return read_config(&project_path);
    }

    match user_config {
        Some(path) if path.exists() => read_config(path),
        _ => Ok(IndexConfig::default()),
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("frindex/config.toml"))
}

fn read_config(path: &Path) -> Result<IndexConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<IndexConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the database path: explicit override, then config, then the
/// project default. Relative paths are resolved against `project_root`.
#[must_use]
pub fn resolve_database_path(
    project_root: &Path,
    config: &IndexConfig,
    override_path: Option<&Path>,
) -> PathBuf {
    let path = override_path
        .map(Path::to_path_buf)
        .or_else(|| config.database.path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}

/// The set of years an index can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailableYears {
    min: i32,
    max: i32,
}

impl AvailableYears {
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Years from config, with an unset maximum meaning `today`'s year.
    #[must_use]
    pub fn from_config(config: &YearsConfig, today: NaiveDate) -> Self {
        Self::new(config.min, config.max.unwrap_or_else(|| today.year()))
    }

    #[must_use]
    pub const fn min(&self) -> i32 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> i32 {
        self.max
    }

    #[must_use]
    pub const fn contains(&self, year: i32) -> bool {
        year >= self.min && year <= self.max
    }

    /// Available years, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<i32> {
        (self.min..=self.max).rev().collect()
    }

    /// Fail fast when `year` is outside the range.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::YearNotAvailable`] for out-of-range years.
    pub fn check(&self, year: i32) -> Result<(), IndexError> {
        if self.contains(year) {
            Ok(())
        } else {
            Err(IndexError::YearNotAvailable {
                year,
                min: self.min,
                max: self.max,
            })
        }
    }
}

const fn default_min_year() -> i32 {
    2013
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let absent_user = dir.path().join("user/frindex/config.toml");

        let config = load_config_with(dir.path(), Some(&absent_user)).expect("load config");
        assert_eq!(config.years.min, 2013);
        assert_eq!(config.years.max, None);
        assert!(config.database.path.is_none());

        let config = load_config_with(dir.path(), None).expect("load config");
        assert_eq!(config.years.min, 2013);
    }

    #[test]
    fn user_config_applies_without_project_config() {
        let dir = TempDir::new().expect("temp dir");
        let user = dir.path().join("user/frindex/config.toml");
        std::fs::create_dir_all(user.parent().expect("parent")).expect("mkdir");
        std::fs::write(&user, "[years]\nmin = 2015\n").expect("write user config");

        let config = load_config_with(dir.path(), Some(&user)).expect("load config");
        assert_eq!(config.years.min, 2015);

        std::fs::create_dir_all(dir.path().join(".frindex")).expect("mkdir");
        std::fs::write(dir.path().join(PROJECT_CONFIG_PATH), "[years]\nmin = 2017\n")
            .expect("write project config");
        let config = load_config_with(dir.path(), Some(&user)).expect("load config");
        assert_eq!(config.years.min, 2017);
    }

    #[test]
    fn project_config_overrides_years_and_database() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::create_dir_all(dir.path().join(".frindex")).expect("mkdir");
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_PATH),
            "[years]\nmin = 2012\nmax = 2020\n\n[database]\npath = \"data/fr.db\"\n",
        )
        .expect("write config");

        let config = load_config(dir.path()).expect("load config");
        assert_eq!(config.years.min, 2012);
        assert_eq!(config.years.max, Some(2020));

        let db = resolve_database_path(dir.path(), &config, None);
        assert_eq!(db, dir.path().join("data/fr.db"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::create_dir_all(dir.path().join(".frindex")).expect("mkdir");
        std::fs::write(dir.path().join(PROJECT_CONFIG_PATH), "[years\nmin = ").expect("write");

        let err = load_config(dir.path()).expect_err("parse should fail");
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn database_override_wins() {
        let root = Path::new("/srv/fr");
        let mut config = IndexConfig::default();
        config.database.path = Some(PathBuf::from("cfg.db"));

        assert_eq!(
            resolve_database_path(root, &config, Some(Path::new("/tmp/x.db"))),
            PathBuf::from("/tmp/x.db")
        );
        assert_eq!(
            resolve_database_path(root, &config, None),
            PathBuf::from("/srv/fr/cfg.db")
        );
        assert_eq!(
            resolve_database_path(root, &IndexConfig::default(), None),
            PathBuf::from("/srv/fr/.frindex/index.db")
        );
    }

    #[test]
    fn available_years_default_to_current_year() {
        let years = AvailableYears::from_config(&YearsConfig::default(), date(2016, 3, 1));
        assert_eq!(years.list(), vec![2016, 2015, 2014, 2013]);
        assert!(years.contains(2013));
        assert!(!years.contains(2012));
        assert!(!years.contains(2017));
    }

    #[test]
    fn check_rejects_out_of_range_years() {
        let years = AvailableYears::new(2013, 2020);
        assert!(years.check(2020).is_ok());

        let err = years.check(2021).expect_err("future year");
        assert!(matches!(
            err,
            IndexError::YearNotAvailable {
                year: 2021,
                min: 2013,
                max: 2020
            }
        ));
    }
}
