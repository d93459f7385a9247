pub mod agency;
pub mod checkpoint;
pub mod completions;
pub mod grouping;
pub mod import;
pub mod index;
pub mod init;
pub mod update_cache;
pub mod years;

use crate::output::{CliError, OutputMode, fail};
use anyhow::Result;
use chrono::NaiveDate;
use frindex_core::backend::AgencyDirectory;
use frindex_core::config::{self, AvailableYears};
use frindex_core::db::SqliteBackend;
use frindex_core::error::{ErrorCode, IndexError};
use frindex_core::model::agency::Agency;
use frindex_core::window;
use std::path::{Path, PathBuf};

/// Everything a command needs from the invocation: project root, available
/// years, the database location and the output mode.
#[derive(Debug)]
pub struct CmdContext {
    pub project_root: PathBuf,
    pub years: AvailableYears,
    pub db_path: PathBuf,
    pub output: OutputMode,
}

impl CmdContext {
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load(project_root: &Path, db_override: Option<&Path>, output: OutputMode) -> Result<Self> {
        let config = match config::load_config(project_root) {
            Ok(config) => config,
            Err(err) => {
                return Err(fail(
                    output,
                    &CliError::coded(ErrorCode::ConfigParseError, format!("{err:#}")),
                ));
            }
        };
        let years = AvailableYears::from_config(&config.years, window::today());
        let db_path = config::resolve_database_path(project_root, &config, db_override);

        Ok(Self {
            project_root: project_root.to_path_buf(),
            years,
            db_path,
            output,
        })
    }

    /// Open the existing index database.
    ///
    /// # Errors
    ///
    /// Fails with `E1001` when the database file does not exist yet.
    pub fn open_backend(&self) -> Result<SqliteBackend> {
        if !self.db_path.exists() {
            return Err(fail(
                self.output,
                &CliError::coded(
                    ErrorCode::NotInitialized,
                    format!("index database not found at {}", self.db_path.display()),
                ),
            ));
        }
        SqliteBackend::open(&self.db_path).map_err(|err| {
            fail(
                self.output,
                &CliError::coded(ErrorCode::BackendUnavailable, format!("{err:#}")),
            )
        })
    }

    /// Fail fast on a year outside the configured range.
    ///
    /// # Errors
    ///
    /// Renders and returns `E2001` for unavailable years.
    pub fn check_year(&self, year: i32) -> Result<()> {
        self.years
            .check(year)
            .map_err(|err| self.index_error(&err))
    }

    /// Render an [`IndexError`] and convert it for `?`.
    pub fn index_error(&self, err: &IndexError) -> anyhow::Error {
        fail(self.output, &CliError::from(err))
    }

    /// Look an agency up by slug or id, failing with `E2002` on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or finds nothing.
    pub fn find_agency(&self, backend: &SqliteBackend, key: &str) -> Result<Agency> {
        match backend.find_agency(key)? {
            Some(agency) => Ok(agency),
            None => Err(fail(
                self.output,
                &CliError::coded(ErrorCode::AgencyNotFound, format!("agency '{key}' not found")),
            )),
        }
    }
}

/// Parse a `YYYY-MM-DD` argument for clap.
pub fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    window::parse_date(raw).map_err(|err| format!("invalid date '{raw}': {err}"))
}
