use super::agency::{GroupingView, render_grouping};
use super::{CmdContext, parse_date_arg};
use crate::output::{CliError, fail, pretty_section, render_mode};
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use frindex_core::error::ErrorCode;
use frindex_core::{AgencyYear, AgencyYearOptions};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct GroupingArgs {
    /// Agency slug or numeric id.
    pub agency: String,

    #[arg(long)]
    pub year: i32,

    /// Entry-type code, e.g. RULE or NOTICE.
    #[arg(long = "type", value_name = "CODE")]
    pub granule_class: String,

    /// Displayed grouping header (subject, or document for top-level
    /// groupings).
    #[arg(long)]
    pub header: String,

    #[arg(long, value_parser = parse_date_arg)]
    pub max_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct GroupingReport {
    agency: String,
    year: i32,
    granule_class: String,
    grouping: GroupingView,
}

/// Execute `fri grouping <agency> --year <year> --type <code> --header <h>`.
///
/// # Errors
///
/// Fails with `E2003` when no grouping matches.
pub fn run_grouping(args: &GroupingArgs, ctx: &CmdContext) -> Result<()> {
    ctx.check_year(args.year)?;
    let backend = ctx.open_backend()?;
    let agency = ctx.find_agency(&backend, &args.agency)?;
    let slug = agency.to_param();

    let agency_year = AgencyYear::new(
        &backend,
        agency,
        args.year,
        &ctx.years,
        AgencyYearOptions {
            max_date: args.max_date,
            ..AgencyYearOptions::default()
        },
    )
    .map_err(|err| ctx.index_error(&err))?;

    let found = agency_year
        .grouping_for(&args.granule_class, &args.header)
        .map_err(|err| ctx.index_error(&err))?;
    let Some(grouping) = found else {
        return Err(fail(
            ctx.output,
            &CliError::coded(
                ErrorCode::GroupingNotFound,
                format!(
                    "no {} grouping '{}' for {slug} in {}",
                    args.granule_class, args.header, args.year
                ),
            ),
        ));
    };

    let report = GroupingReport {
        agency: slug,
        year: args.year,
        granule_class: args.granule_class.clone(),
        grouping: GroupingView::from(grouping),
    };
    render_mode(ctx.output, &report, render_text, render_pretty)
}

fn render_text(report: &GroupingReport, w: &mut dyn Write) -> io::Result<()> {
    let documents = match &report.grouping {
        GroupingView::Subject { documents, .. } => documents.iter().collect::<Vec<_>>(),
        GroupingView::Document(doc) => vec![doc],
    };
    for doc in documents {
        for entry in &doc.entries {
            writeln!(
                w,
                "{}\t{}\t{}\t{}",
                doc.header, entry.document_number, entry.publication_date, entry.title
            )?;
        }
    }
    Ok(())
}

fn render_pretty(report: &GroupingReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!(
            "{} {} ({})",
            report.agency, report.year, report.granule_class
        ),
    )?;
    render_grouping(w, &report.grouping)
}
