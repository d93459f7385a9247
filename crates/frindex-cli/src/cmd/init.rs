use super::CmdContext;
use crate::output::{pretty_kv, render};
use anyhow::{Context as _, Result};
use clap::Args;
use frindex_core::config::PROJECT_CONFIG_PATH;
use frindex_core::db::{self, migrations};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing `.frindex/config.toml` with the default template.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[years]\n\
    min = 2013\n\
    # max = 2026  # defaults to the current calendar year\n\
    \n\
    [database]\n\
    path = \".frindex/index.db\"\n";

#[derive(Debug, Serialize)]
struct InitReport {
    config_path: String,
    config_written: bool,
    db_path: String,
    schema_version: u32,
}

/// Execute `fri init`: write the default config (unless present) and
/// create or migrate the index database.
///
/// Re-running is safe; existing data is migrated in place.
///
/// # Errors
///
/// Returns an error if a filesystem or database operation fails.
pub fn run_init(args: &InitArgs, ctx: &CmdContext) -> Result<()> {
    let config_path = ctx.project_root.join(PROJECT_CONFIG_PATH);
    let write_config = args.force || !config_path.exists();
    if write_config {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&config_path, CONFIG_TOML)
            .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
    }

    let conn = db::open_index(&ctx.db_path)?;
    let schema_version = migrations::current_schema_version(&conn)?;

    let report = InitReport {
        config_path: config_path.display().to_string(),
        config_written: write_config,
        db_path: ctx.db_path.display().to_string(),
        schema_version,
    };

    render(ctx.output, &report, |r, w| {
        writeln!(w, "✓ Index ready.")?;
        pretty_kv(w, "Config", &r.config_path)?;
        pretty_kv(w, "Database", &r.db_path)?;
        pretty_kv(w, "Schema version", r.schema_version.to_string())?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  fri import --file bundle.json")?;
        writeln!(w, "  fri index --year <year>")
    })
}
