use super::{CmdContext, parse_date_arg};
use crate::output::{pretty_section, render_mode};
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use frindex_core::{AgencyYear, IndexBuilder};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct IndexArgs {
    #[arg(long)]
    pub year: i32,

    /// Only count entries published on or before this date.
    #[arg(long, value_parser = parse_date_arg)]
    pub max_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct AgencyRow {
    id: i64,
    name: String,
    slug: String,
    entry_count: usize,
    needs_attention_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<AgencyRow>,
}

#[derive(Debug, Serialize)]
struct LetterGroup {
    letter: char,
    agencies: Vec<AgencyRow>,
}

#[derive(Debug, Serialize)]
struct IndexReport {
    year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_date: Option<NaiveDate>,
    agency_count: usize,
    letters: Vec<LetterGroup>,
}

/// Execute `fri index --year <year>`: every agency with entries in the
/// window, grouped by first letter.
///
/// # Errors
///
/// Returns an error for an unavailable year or a backend failure.
pub fn run_index(args: &IndexArgs, ctx: &CmdContext) -> Result<()> {
    ctx.check_year(args.year)?;
    let backend = ctx.open_backend()?;
    let builder = IndexBuilder::new(&backend, args.year, args.max_date, ctx.years)
        .map_err(|err| ctx.index_error(&err))?;

    let report = build_report(&builder).map_err(|err| ctx.index_error(&err))?;
    render_mode(ctx.output, &report, render_text, render_pretty)
}

fn build_report(builder: &IndexBuilder<'_>) -> frindex_core::Result<IndexReport> {
    let mut letters = Vec::new();
    for (letter, agencies) in builder.agencies_by_letter()? {
        let rows = agencies
            .into_iter()
            .map(agency_row)
            .collect::<frindex_core::Result<Vec<_>>>()?;
        letters.push(LetterGroup {
            letter,
            agencies: rows,
        });
    }

    Ok(IndexReport {
        year: builder.year(),
        max_date: builder.max_date(),
        agency_count: builder.agencies()?.len(),
        letters,
    })
}

fn agency_row(agency_year: &AgencyYear<'_>) -> frindex_core::Result<AgencyRow> {
    // Parents with children carry no precomputed count; scope it here.
    let entry_count = match agency_year.known_entry_count() {
        Some(count) => count,
        None => agency_year.entry_count()?,
    };
    let children = agency_year
        .children()
        .iter()
        .map(agency_row)
        .collect::<frindex_core::Result<Vec<_>>>()?;

    Ok(AgencyRow {
        id: agency_year.agency().id,
        name: agency_year.name().to_string(),
        slug: agency_year.slug(),
        entry_count,
        needs_attention_count: agency_year.needs_attention_count()?,
        children,
    })
}

fn render_text(report: &IndexReport, w: &mut dyn Write) -> io::Result<()> {
    for group in &report.letters {
        for agency in &group.agencies {
            writeln!(
                w,
                "{}\t{}\t{}\t{}",
                agency.slug, agency.name, agency.entry_count, agency.needs_attention_count
            )?;
        }
    }
    Ok(())
}

fn render_pretty(report: &IndexReport, w: &mut dyn Write) -> io::Result<()> {
    let heading = match report.max_date {
        Some(max_date) => format!("Index {} through {max_date}", report.year),
        None => format!("Index {}", report.year),
    };
    pretty_section(w, &heading)?;
    if report.letters.is_empty() {
        return writeln!(w, "No agencies have entries in this window.");
    }

    for group in &report.letters {
        writeln!(w)?;
        writeln!(w, "{}", group.letter)?;
        for agency in &group.agencies {
            write_agency(w, agency, "  ")?;
            for child in &agency.children {
                write_agency(w, child, "      ")?;
            }
        }
    }
    Ok(())
}

fn write_agency(w: &mut dyn Write, agency: &AgencyRow, indent: &str) -> io::Result<()> {
    let attention = if agency.needs_attention_count > 0 {
        format!(", {} need attention", agency.needs_attention_count)
    } else {
        String::new()
    };
    writeln!(
        w,
        "{indent}{}  ({} entries{attention})",
        agency.name, agency.entry_count
    )
}
