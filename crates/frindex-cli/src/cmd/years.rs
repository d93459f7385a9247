use super::CmdContext;
use crate::output::render_mode;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct YearsReport {
    min: i32,
    max: i32,
    /// Newest first.
    years: Vec<i32>,
}

/// Execute `fri years`.
///
/// # Errors
///
/// Returns an error if rendering fails.
pub fn run_years(ctx: &CmdContext) -> Result<()> {
    let report = YearsReport {
        min: ctx.years.min(),
        max: ctx.years.max(),
        years: ctx.years.list(),
    };

    render_mode(
        ctx.output,
        &report,
        |r, w| {
            for year in &r.years {
                writeln!(w, "{year}")?;
            }
            Ok(())
        },
        |r, w| {
            writeln!(w, "Available years ({}..={}):", r.min, r.max)?;
            let listed: Vec<String> = r.years.iter().map(ToString::to_string).collect();
            writeln!(w, "  {}", listed.join(" "))
        },
    )
}
