use super::{CmdContext, parse_date_arg};
use crate::output::{CliError, fail, pretty_kv, render};
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use frindex_core::{AgencyYear, AgencyYearOptions};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct CheckpointArgs {
    /// Agency slug or numeric id.
    pub agency: String,

    #[arg(long)]
    pub year: i32,

    /// Last issue the editor has finished reviewing.
    #[arg(long, value_parser = parse_date_arg)]
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct CheckpointReport {
    agency: String,
    year: i32,
    last_completed_issue: NaiveDate,
    needs_attention_count: usize,
}

/// Execute `fri checkpoint <agency> --year <year> --date <date>`.
///
/// Stores the checkpoint and then refreshes the agency-year's cached
/// needs-attention count, since the checkpoint changes it.
///
/// # Errors
///
/// Returns an error for an unavailable year, an unknown agency, or a
/// backend failure.
pub fn run_checkpoint(args: &CheckpointArgs, ctx: &CmdContext) -> Result<()> {
    ctx.check_year(args.year)?;
    let backend = ctx.open_backend()?;
    let agency = ctx.find_agency(&backend, &args.agency)?;
    let slug = agency.to_param();

    backend
        .set_last_completed_issue(args.year, agency.id, args.date)
        .map_err(|err| fail(ctx.output, &CliError::new(format!("{err:#}"))))?;

    let agency_year = AgencyYear::new(
        &backend,
        agency,
        args.year,
        &ctx.years,
        AgencyYearOptions::default(),
    )
    .map_err(|err| ctx.index_error(&err))?;
    agency_year
        .update_cache()
        .map_err(|err| ctx.index_error(&err))?;
    let needs_attention_count = agency_year
        .needs_attention_count()
        .map_err(|err| ctx.index_error(&err))?;

    let report = CheckpointReport {
        agency: slug,
        year: args.year,
        last_completed_issue: args.date,
        needs_attention_count,
    };
    render(ctx.output, &report, |r, w| {
        writeln!(w, "✓ Checkpoint set for {} ({})", r.agency, r.year)?;
        pretty_kv(w, "Last completed", r.last_completed_issue.to_string())?;
        pretty_kv(w, "Needs attention", r.needs_attention_count.to_string())
    })
}
