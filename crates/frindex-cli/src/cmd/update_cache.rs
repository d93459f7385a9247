use super::CmdContext;
use crate::output::{pretty_kv, render_mode};
use anyhow::Result;
use clap::Args;
use frindex_core::model::agency::Agency;
use frindex_core::{AgencyYear, AgencyYearOptions, IndexBuilder};
use serde::Serialize;
use std::io::Write;
use tracing::info;

#[derive(Args, Debug)]
pub struct UpdateCacheArgs {
    #[arg(long)]
    pub year: i32,

    /// Refresh a single agency (slug or id) instead of every agency with
    /// entries in the year.
    #[arg(long)]
    pub agency: Option<String>,
}

#[derive(Debug, Serialize)]
struct CacheRow {
    agency: String,
    needs_attention_count: usize,
}

#[derive(Debug, Serialize)]
struct UpdateCacheReport {
    year: i32,
    updated: Vec<CacheRow>,
}

/// Execute `fri update-cache --year <year>`.
///
/// Every agency-year is recomputed from its entries; counts already in the
/// cache are never written back as-is.
///
/// # Errors
///
/// Returns an error for an unavailable year, an unknown agency, or a
/// backend failure.
pub fn run_update_cache(args: &UpdateCacheArgs, ctx: &CmdContext) -> Result<()> {
    ctx.check_year(args.year)?;
    let backend = ctx.open_backend()?;

    let agencies: Vec<Agency> = if let Some(key) = &args.agency {
        vec![ctx.find_agency(&backend, key)?]
    } else {
        let builder = IndexBuilder::new(&backend, args.year, None, ctx.years)
            .map_err(|err| ctx.index_error(&err))?;
        builder
            .agencies()
            .map_err(|err| ctx.index_error(&err))?
            .iter()
            .map(|agency_year| agency_year.agency().clone())
            .collect()
    };

    let mut updated = Vec::with_capacity(agencies.len());
    for agency in agencies {
        let slug = agency.to_param();
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
        updated.push(CacheRow {
            agency: slug,
            needs_attention_count: agency_year
                .needs_attention_count()
                .map_err(|err| ctx.index_error(&err))?,
        });
    }
    info!(year = args.year, agencies = updated.len(), "status cache refreshed");

    let report = UpdateCacheReport {
        year: args.year,
        updated,
    };
    render_mode(
        ctx.output,
        &report,
        |r, w| {
            for row in &r.updated {
                writeln!(w, "{}\t{}", row.agency, row.needs_attention_count)?;
            }
            Ok(())
        },
        |r, w| {
            writeln!(w, "✓ Refreshed {} agency-year(s) for {}", r.updated.len(), r.year)?;
            for row in &r.updated {
                pretty_kv(w, &row.agency, row.needs_attention_count.to_string())?;
            }
            Ok(())
        },
    )
}
