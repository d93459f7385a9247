use super::CmdContext;
use crate::output::{CliError, fail, pretty_kv, render};
use anyhow::Result;
use clap::Args;
use frindex_core::db::ImportBundle;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON bundle with agencies, dockets, regulatory plans, entries and
    /// checkpoints.
    #[arg(long)]
    pub file: PathBuf,
}

/// Execute `fri import --file <bundle.json>`.
///
/// The bundle is loaded in a single transaction.
///
/// # Errors
///
/// Returns an error if the database is missing, the bundle is invalid, or
/// any row violates a constraint.
pub fn run_import(args: &ImportArgs, ctx: &CmdContext) -> Result<()> {
    let backend = ctx.open_backend()?;
    let bundle = ImportBundle::from_path(&args.file)
        .map_err(|err| fail(ctx.output, &CliError::new(format!("{err:#}"))))?;
    let summary = backend
        .import(&bundle)
        .map_err(|err| fail(ctx.output, &CliError::new(format!("{err:#}"))))?;

    render(ctx.output, &summary, |s, w| {
        writeln!(w, "✓ Imported {}", args.file.display())?;
        pretty_kv(w, "Agencies", s.agencies.to_string())?;
        pretty_kv(w, "Dockets", s.dockets.to_string())?;
        pretty_kv(w, "Plans", s.regulatory_plans.to_string())?;
        pretty_kv(w, "Entries", s.entries.to_string())?;
        pretty_kv(w, "Checkpoints", s.checkpoints.to_string())
    })
}
