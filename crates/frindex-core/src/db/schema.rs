//! SQLite schema for the reference index store.
//!
//! - `entries` holds the printed table-of-contents text (`toc_*`) and the
//!   editor overrides (`fr_index_*`) side by side
//! - `public_inspection_documents` carries pre-publication TOC text that wins
//!   over the printed text when present
//! - `agency_assignments` is the many-to-many entry/agency edge
//! - `agency_statuses` holds both the editor checkpoint and the cached
//!   needs-attention counters for an agency-year

/// Migration v1: core tables plus index metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS agencies (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    slug TEXT UNIQUE,
    parent_id INTEGER REFERENCES agencies(id) ON DELETE SET NULL DEFERRABLE INITIALLY DEFERRED,
    CHECK (parent_id IS NULL OR parent_id <> id)
);

CREATE TABLE IF NOT EXISTS dockets (
    id TEXT PRIMARY KEY,
    comments_count INTEGER NOT NULL DEFAULT 0 CHECK (comments_count >= 0)
);

CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    document_number TEXT NOT NULL UNIQUE,
    publication_date TEXT NOT NULL,
    toc_subject TEXT,
    toc_doc TEXT,
    fr_index_subject TEXT,
    fr_index_doc TEXT,
    granule_class TEXT NOT NULL,
    start_page INTEGER CHECK (start_page IS NULL OR start_page >= 0),
    end_page INTEGER CHECK (end_page IS NULL OR end_page >= 0),
    docket_id TEXT REFERENCES dockets(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS public_inspection_documents (
    entry_id INTEGER PRIMARY KEY REFERENCES entries(id) ON DELETE CASCADE,
    toc_subject TEXT,
    toc_doc TEXT
);

CREATE TABLE IF NOT EXISTS agency_assignments (
    entry_id INTEGER NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
    agency_id INTEGER NOT NULL REFERENCES agencies(id) ON DELETE CASCADE,
    PRIMARY KEY (entry_id, agency_id)
);

CREATE TABLE IF NOT EXISTS comment_close_events (
    entry_id INTEGER PRIMARY KEY REFERENCES entries(id) ON DELETE CASCADE,
    date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS regulatory_plans (
    regulation_id_number TEXT NOT NULL,
    issue TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    priority_category TEXT,
    current INTEGER NOT NULL DEFAULT 1 CHECK (current IN (0, 1)),
    plan_json TEXT NOT NULL,
    PRIMARY KEY (regulation_id_number, issue)
);

CREATE TABLE IF NOT EXISTS entry_regulation_id_numbers (
    entry_id INTEGER NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
    regulation_id_number TEXT NOT NULL,
    PRIMARY KEY (entry_id, regulation_id_number)
);

CREATE TABLE IF NOT EXISTS agency_statuses (
    year INTEGER NOT NULL,
    agency_id INTEGER NOT NULL REFERENCES agencies(id) ON DELETE CASCADE,
    needs_attention_count INTEGER NOT NULL DEFAULT 0 CHECK (needs_attention_count >= 0),
    last_published TEXT,
    last_completed_issue TEXT,
    PRIMARY KEY (year, agency_id)
);

CREATE TABLE IF NOT EXISTS index_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO index_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: read-path indexes for scoped entry queries.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_entries_publication_date
    ON entries(publication_date, id);

CREATE INDEX IF NOT EXISTS idx_agency_assignments_agency
    ON agency_assignments(agency_id, entry_id);

CREATE INDEX IF NOT EXISTS idx_agencies_parent
    ON agencies(parent_id);

CREATE INDEX IF NOT EXISTS idx_agency_statuses_year
    ON agency_statuses(year, agency_id);

CREATE INDEX IF NOT EXISTS idx_regulatory_plans_current
    ON regulatory_plans(regulation_id_number, current);
";

/// Migration v3: the cached count becomes nullable so a checkpoint-only row
/// no longer reads as a computed zero. Rows with no cached snapshot are
/// cleared to NULL.
pub const MIGRATION_V3_SQL: &str = r"
CREATE TABLE agency_statuses_v3 (
    year INTEGER NOT NULL,
    agency_id INTEGER NOT NULL REFERENCES agencies(id) ON DELETE CASCADE,
    needs_attention_count INTEGER CHECK (needs_attention_count IS NULL OR needs_attention_count >= 0),
    last_published TEXT,
    last_completed_issue TEXT,
    PRIMARY KEY (year, agency_id)
);

INSERT INTO agency_statuses_v3
    (year, agency_id, needs_attention_count, last_published, last_completed_issue)
SELECT
    year,
    agency_id,
    CASE
        WHEN needs_attention_count = 0 AND last_published IS NULL THEN NULL
        ELSE needs_attention_count
    END,
    last_published,
    last_completed_issue
FROM agency_statuses;

DROP TABLE agency_statuses;
ALTER TABLE agency_statuses_v3 RENAME TO agency_statuses;

CREATE INDEX IF NOT EXISTS idx_agency_statuses_year
    ON agency_statuses(year, agency_id);
";

/// Indexes every migrated database must carry.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_entries_publication_date",
    "idx_agency_assignments_agency",
    "idx_agencies_parent",
    "idx_agency_statuses_year",
    "idx_regulatory_plans_current",
];

/// Tables every migrated database must carry.
pub const REQUIRED_TABLES: &[&str] = &[
    "agencies",
    "dockets",
    "entries",
    "public_inspection_documents",
    "agency_assignments",
    "comment_close_events",
    "regulatory_plans",
    "entry_regulation_id_numbers",
    "agency_statuses",
    "index_meta",
];
