//! SQL schema for the shelfwatch SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
///
/// The three partial unique indexes on `alerts` are the storage-level
/// backstop for the dedup invariants: at most one ACTIVE shelf-level
/// stock-tier alert per shelf, one ACTIVE misplacement alert per
/// (shelf, detected label), and one ACTIVE missing-items alert per shelf.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS shelves (
    name       TEXT PRIMARY KEY,
    capacity   INTEGER NOT NULL DEFAULT 0,
    is_active  INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS inventory (
    product_number TEXT PRIMARY KEY,
    shelf_name     TEXT NOT NULL REFERENCES shelves(name),
    product_name   TEXT NOT NULL,
    category       TEXT,
    rack_name      TEXT
);

CREATE TABLE IF NOT EXISTS staff_assignments (
    id           INTEGER PRIMARY KEY,
    shelf_name   TEXT NOT NULL REFERENCES shelves(name),
    employee_id  TEXT NOT NULL,
    is_active    INTEGER NOT NULL DEFAULT 1,
    assigned_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS alerts (
    id                INTEGER PRIMARY KEY,
    alert_type        TEXT NOT NULL,
    priority          TEXT NOT NULL,
    priority_rank     INTEGER NOT NULL,   -- integer mirror of priority, for ORDER BY
    status            TEXT NOT NULL,
    shelf_name        TEXT NOT NULL,
    rack_name         TEXT,               -- NULL for shelf-level alerts
    product_number    TEXT,
    product_name      TEXT,
    category          TEXT,
    title             TEXT NOT NULL,
    message           TEXT NOT NULL,
    expected_product  TEXT,
    actual_product    TEXT,
    correct_location  TEXT,
    empty_percentage  REAL,
    fill_percentage   REAL,
    assigned_staff_id TEXT,
    created_by        TEXT NOT NULL DEFAULT 'system',
    created_at        TEXT NOT NULL,      -- ISO 8601 UTC; store-assigned
    updated_at        TEXT NOT NULL,
    acknowledged_at   TEXT,
    resolved_at       TEXT
);

-- Audit trail: strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS alert_history (
    id           INTEGER PRIMARY KEY,
    alert_id     INTEGER NOT NULL REFERENCES alerts(id),
    action       TEXT NOT NULL,
    performed_by TEXT,                    -- NULL for system actions
    notes        TEXT,
    timestamp    TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS alerts_active_stock_idx
    ON alerts(shelf_name)
    WHERE status = 'active'
      AND rack_name IS NULL
      AND alert_type IN ('low_stock', 'medium_stock', 'high_stock',
                         'critical_stock', 'out_of_stock');

CREATE UNIQUE INDEX IF NOT EXISTS alerts_active_misplaced_idx
    ON alerts(shelf_name, actual_product)
    WHERE status = 'active'
      AND alert_type = 'misplaced_item'
      AND actual_product IS NOT NULL;

CREATE UNIQUE INDEX IF NOT EXISTS alerts_active_missing_idx
    ON alerts(shelf_name)
    WHERE status = 'active'
      AND alert_type = 'misplaced_item'
      AND instr(title, 'MISSING ITEMS') > 0;

CREATE INDEX IF NOT EXISTS alerts_shelf_idx         ON alerts(shelf_name);
CREATE INDEX IF NOT EXISTS alerts_status_idx        ON alerts(status);
CREATE INDEX IF NOT EXISTS alert_history_alert_idx  ON alert_history(alert_id);
CREATE INDEX IF NOT EXISTS inventory_shelf_idx      ON inventory(shelf_name);
CREATE INDEX IF NOT EXISTS assignments_shelf_idx    ON staff_assignments(shelf_name);

PRAGMA user_version = 1;
";
