//! `fri agency`: one agency-year broken down into document types, subject
//! groupings and document groupings.

use super::{CmdContext, parse_date_arg};
use crate::output::{pretty_kv, pretty_rule, pretty_section, render_mode, yes_no};
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use frindex_core::grouping::{DocumentGrouping, DocumentTypePartition, Grouping};
use frindex_core::model::agency::Agency;
use frindex_core::model::entry::Entry;
use frindex_core::{AgencyYear, AgencyYearOptions};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct AgencyArgs {
    /// Agency slug or numeric id.
    pub agency: String,

    #[arg(long)]
    pub year: i32,

    /// Only include entries published on or before this date.
    #[arg(long, value_parser = parse_date_arg)]
    pub max_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    pub id: i64,
    pub document_number: String,
    pub title: String,
    pub publication_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_range: Option<String>,
    pub pdf_url: String,
    pub significant: bool,
    pub modified: bool,
    pub comments_open: bool,
    pub comment_count: u32,
}

impl From<&Entry> for EntryView {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            document_number: entry.document_number.clone(),
            title: entry.title.clone(),
            publication_date: entry.publication_date,
            page_range: entry.page_range(),
            pdf_url: entry.pdf_url(),
            significant: entry.is_significant(),
            modified: entry.is_modified(),
            comments_open: entry.comments_open(),
            comment_count: entry.comment_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub header: String,
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_subject: Option<String>,
    pub entry_count: usize,
    pub needs_attention: bool,
    pub significant: bool,
    pub comments_open: bool,
    pub has_comments: bool,
    pub entries: Vec<EntryView>,
}

impl From<&DocumentGrouping> for DocumentView {
    fn from(grouping: &DocumentGrouping) -> Self {
        Self {
            header: grouping.header().to_string(),
            identifier: grouping.identifier(),
            parent_subject: grouping.parent_subject().map(str::to_string),
            entry_count: grouping.entry_count(),
            needs_attention: grouping.needs_attention(),
            significant: grouping.significant(),
            comments_open: grouping.comments_open(),
            has_comments: grouping.has_comments(),
            entries: grouping.entries().iter().map(EntryView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupingView {
    Subject {
        header: String,
        identifier: String,
        entry_count: usize,
        needs_attention_count: usize,
        documents: Vec<DocumentView>,
    },
    Document(DocumentView),
}

impl From<&Grouping> for GroupingView {
    fn from(grouping: &Grouping) -> Self {
        match grouping {
            Grouping::Subject(subject) => Self::Subject {
                header: subject.header().to_string(),
                identifier: subject.identifier(),
                entry_count: subject.entry_count(),
                needs_attention_count: subject.needs_attention_count(),
                documents: subject
                    .document_groupings()
                    .iter()
                    .map(DocumentView::from)
                    .collect(),
            },
            Grouping::Document(document) => Self::Document(DocumentView::from(document)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentTypeView {
    pub code: String,
    pub name: String,
    pub entry_count: usize,
    pub needs_attention_count: usize,
    pub groupings: Vec<GroupingView>,
}

impl From<&DocumentTypePartition> for DocumentTypeView {
    fn from(partition: &DocumentTypePartition) -> Self {
        Self {
            code: partition.granule_class().to_string(),
            name: partition.name().to_string(),
            entry_count: partition.entry_count(),
            needs_attention_count: partition.needs_attention_count(),
            groupings: partition.groupings().iter().map(GroupingView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AgencyReport {
    agency: Agency,
    year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_date: Option<NaiveDate>,
    last_completed_issue: Option<NaiveDate>,
    last_issue: Option<NaiveDate>,
    entry_count: usize,
    needs_attention_count: usize,
    document_types: Vec<DocumentTypeView>,
}

/// Execute `fri agency <agency> --year <year>`.
///
/// # Errors
///
/// Returns an error for an unavailable year, an unknown agency, or a
/// backend failure.
pub fn run_agency(args: &AgencyArgs, ctx: &CmdContext) -> Result<()> {
    ctx.check_year(args.year)?;
    let backend = ctx.open_backend()?;
    let agency = ctx.find_agency(&backend, &args.agency)?;

    let agency_year = AgencyYear::new(
        &backend,
        agency.clone(),
        args.year,
        &ctx.years,
        AgencyYearOptions {
            max_date: args.max_date,
            ..AgencyYearOptions::default()
        },
    )
    .map_err(|err| ctx.index_error(&err))?;

    let report = build_report(agency, &agency_year).map_err(|err| ctx.index_error(&err))?;
    render_mode(ctx.output, &report, render_text, render_pretty)
}

fn build_report(
    agency: Agency,
    agency_year: &AgencyYear<'_>,
) -> frindex_core::Result<AgencyReport> {
    let document_types: Vec<DocumentTypeView> = agency_year
        .document_types()?
        .iter()
        .map(DocumentTypeView::from)
        .collect();

    Ok(AgencyReport {
        agency,
        year: agency_year.year(),
        max_date: agency_year.max_date(),
        last_completed_issue: agency_year.last_completed_issue()?,
        last_issue: agency_year.last_issue()?,
        entry_count: agency_year.entries()?.len(),
        needs_attention_count: agency_year.needs_attention_count()?,
        document_types,
    })
}

fn render_text(report: &AgencyReport, w: &mut dyn Write) -> io::Result<()> {
    for dt in &report.document_types {
        for grouping in &dt.groupings {
            match grouping {
                GroupingView::Subject {
                    header, documents, ..
                } => {
                    for doc in documents {
                        write_text_row(w, &dt.code, header, doc)?;
                    }
                }
                GroupingView::Document(doc) => write_text_row(w, &dt.code, "", doc)?,
            }
        }
    }
    Ok(())
}

fn write_text_row(
    w: &mut dyn Write,
    code: &str,
    subject: &str,
    doc: &DocumentView,
) -> io::Result<()> {
    writeln!(
        w,
        "{code}\t{subject}\t{}\t{}\t{}",
        doc.header,
        doc.entry_count,
        u8::from(doc.needs_attention)
    )
}

fn render_pretty(report: &AgencyReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("{} ({})", report.agency.name, report.year))?;
    if let Some(max_date) = report.max_date {
        pretty_kv(w, "Through", max_date.to_string())?;
    }
    pretty_kv(w, "Entries", report.entry_count.to_string())?;
    pretty_kv(w, "Needs attention", report.needs_attention_count.to_string())?;
    pretty_kv(w, "Last completed", optional_date(report.last_completed_issue))?;
    pretty_kv(w, "Last issue", optional_date(report.last_issue))?;

    for dt in &report.document_types {
        writeln!(w)?;
        writeln!(
            w,
            "{} ({}): {} entries, {} need attention",
            dt.name, dt.code, dt.entry_count, dt.needs_attention_count
        )?;
        pretty_rule(w)?;
        for grouping in &dt.groupings {
            render_grouping(w, grouping)?;
        }
    }
    Ok(())
}

/// Pretty rendering of one grouping, shared with `fri grouping`.
pub fn render_grouping(w: &mut dyn Write, grouping: &GroupingView) -> io::Result<()> {
    match grouping {
        GroupingView::Subject {
            header,
            entry_count,
            needs_attention_count,
            documents,
            ..
        } => {
            writeln!(
                w,
                "  {header}  [{entry_count} entries, {needs_attention_count} need attention]"
            )?;
            for doc in documents {
                render_document(w, doc, "    ")?;
            }
        }
        GroupingView::Document(doc) => render_document(w, doc, "  ")?,
    }
    Ok(())
}

fn render_document(w: &mut dyn Write, doc: &DocumentView, indent: &str) -> io::Result<()> {
    let marker = if doc.needs_attention { "*" } else { " " };
    writeln!(
        w,
        "{indent}{marker} {}  [{} entries, significant: {}, comments open: {}]",
        doc.header,
        doc.entry_count,
        yes_no(doc.significant),
        yes_no(doc.comments_open)
    )?;
    for entry in &doc.entries {
        writeln!(
            w,
            "{indent}    {} {} pp. {}",
            entry.publication_date,
            entry.document_number,
            entry.page_range.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}

fn optional_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.to_string())
}

#[cfg(test)]
mod tests {
    use super::{DocumentTypeView, GroupingView, render_grouping};
    use frindex_core::grouping::DocumentTypePartition;
    use frindex_core::model::entry::{Entry, EntryRow};

    fn entry(id: i64, subject: Option<&str>, doc: &str) -> Entry {
        Entry::from_row(
            &EntryRow::new()
                .with("id", id)
                .with("document_number", format!("2020-{id:05}"))
                .with("publication_date", "2020-03-01")
                .with("original_subject", subject)
                .with("original_doc", doc)
                .with("granule_class", "RULE"),
        )
        .expect("valid row")
    }

    #[test]
    fn document_type_view_keeps_grouping_order_and_kinds() {
        let partition = DocumentTypePartition::new(
            "RULE",
            "Rule",
            vec![
                entry(1, Some("Water"), "Ohio"),
                entry(2, None, "Annual report"),
                entry(3, Some("Water"), "Iowa"),
            ],
            None,
        );
        let view = DocumentTypeView::from(&partition);
        assert_eq!(view.entry_count, 3);
        assert_eq!(view.groupings.len(), 2);
        assert!(matches!(&view.groupings[0], GroupingView::Document(doc) if doc.header == "Annual report"));
        match &view.groupings[1] {
            GroupingView::Subject { header, documents, .. } => {
                assert_eq!(header, "Water");
                let headers: Vec<_> = documents.iter().map(|d| d.header.as_str()).collect();
                assert_eq!(headers, vec!["Iowa", "Ohio"]);
            }
            GroupingView::Document(_) => panic!("expected a subject grouping"),
        }

        let json = serde_json::to_value(&view.groupings[1]).expect("serialize");
        assert_eq!(json["kind"], "subject");
    }

    #[test]
    fn pretty_grouping_marks_attention() {
        let partition =
            DocumentTypePartition::new("RULE", "Rule", vec![entry(1, None, "Notice")], None);
        let view = DocumentTypeView::from(&partition);
        let mut buf = Vec::new();
        render_grouping(&mut buf, &view.groupings[0]).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("* Notice"));
    }
}
