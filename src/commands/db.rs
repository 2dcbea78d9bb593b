use crate::analysis::sources::{ClassificationSource, IssueGraph};
use crate::error::{EngineError, EngineResult};
use crate::models::category::{
    Category, CategoryRecord, CategoryWeights, ClassificationPayload, ClassificationRecord,
    DEFAULT_CATEGORY_WEIGHTS,
};
use crate::models::issue::{Issue, IssueFilter, IssueStatus, SuccessorEdge};
use crate::models::workspace::DataDirMeta;
use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result, Row};
use std::collections::HashMap;
use std::path::Path;

const DB_SCHEMA_VERSION: i64 = 3;

const ISSUE_COLUMNS: &str = "id, ticket_number, title, project, repository, client_code, labels, status, opened_at, due_date, closed_at, responsible, link";

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 3 {
        apply_migration_3(conn)?;
        version = 3;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("database schema version {version} is newer than supported {DB_SCHEMA_VERSION}");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS categories (
            name TEXT PRIMARY KEY,
            weight REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS client_scores (
            client_code TEXT PRIMARY KEY,
            description TEXT,
            score
        );

        CREATE TABLE IF NOT EXISTS label_scores (
            label TEXT PRIMARY KEY,
            description TEXT,
            score
        );

        CREATE TABLE IF NOT EXISTS deadline_buckets (
            classification TEXT PRIMARY KEY,
            days TEXT,
            score
        );

        CREATE TABLE IF NOT EXISTS issues (
            id INTEGER PRIMARY KEY,
            ticket_number INTEGER NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            project TEXT NOT NULL DEFAULT '',
            repository TEXT NOT NULL DEFAULT '',
            client_code TEXT NOT NULL DEFAULT '',
            labels TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'opened',
            opened_at TEXT,
            due_date TEXT,
            closed_at TEXT,
            responsible TEXT NOT NULL DEFAULT '',
            link TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS issue_links (
            origin_id INTEGER NOT NULL,
            destination_id INTEGER NOT NULL,
            PRIMARY KEY (origin_id, destination_id)
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> Result<()> {
    add_column_if_missing(conn, "issues", "active INTEGER NOT NULL DEFAULT 1")?;

    for (category, weight) in DEFAULT_CATEGORY_WEIGHTS {
        conn.execute(
            "INSERT OR IGNORE INTO categories (name, weight) VALUES (?1, ?2)",
            params![category.name(), weight],
        )?;
    }

    Ok(())
}

fn apply_migration_3(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_issues_ticket_number ON issues(ticket_number);
        CREATE INDEX IF NOT EXISTS idx_issues_project_status ON issues(project, status);
        CREATE INDEX IF NOT EXISTS idx_issue_links_origin ON issue_links(origin_id);
        ",
    )
}

fn add_column_if_missing(conn: &Connection, table: &str, column_def: &str) -> Result<()> {
    let column_name = column_def
        .split_whitespace()
        .next()
        .unwrap_or(column_def)
        .to_string();

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .filter_map(|res| res.ok())
        .any(|name| name == column_name);

    if !exists {
        conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {column_def}"), [])?;
    }

    Ok(())
}

pub fn get_db_connection(data_dir: &str) -> EngineResult<Connection> {
    let dir = Path::new(data_dir).join(".issuerank");
    std::fs::create_dir_all(&dir)?;
    let conn = Connection::open(dir.join("state.db"))?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    initialize_schema(&conn)?;
    Ok(conn)
}

/// Create (or migrate) the store and settings under `data_dir` and report
/// what it holds.
pub async fn open_data_dir(data_dir: String) -> EngineResult<DataDirMeta> {
    let path = Path::new(&data_dir);
    if !path.is_dir() {
        return Err(EngineError::InvalidInput(format!(
            "data directory does not exist: {data_dir}"
        )));
    }

    let conn = get_db_connection(&data_dir)?;
    crate::commands::settings::load_settings_from_disk(&data_dir)?;

    let count = |sql: &str| -> Result<usize> {
        conn.query_row(sql, [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
    };

    Ok(DataDirMeta {
        path: data_dir.clone(),
        issue_count: count("SELECT COUNT(*) FROM issues WHERE active = 1")?,
        open_issue_count: count("SELECT COUNT(*) FROM issues WHERE active = 1 AND status = 'opened'")?,
        link_count: count("SELECT COUNT(*) FROM issue_links")?,
        category_count: count("SELECT COUNT(*) FROM categories")?,
    })
}

/// Numeric view of a stored score. Text is parsed; anything that is not a
/// finite number reads as absent.
fn coerce_score(value: ValueRef<'_>) -> Option<f64> {
    let parsed = match value {
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(r) => Some(r),
        ValueRef::Text(raw) => std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn load_score_map(conn: &Connection, sql: &str, table: &str) -> Result<HashMap<String, f64>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut scores = HashMap::new();

    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        match coerce_score(row.get_ref(1)?) {
            Some(score) => {
                scores.insert(key, score);
            }
            None => log::warn!("ignoring non-numeric score for {table} entry '{key}'"),
        }
    }

    Ok(scores)
}

pub fn load_client_scores(conn: &Connection) -> Result<HashMap<String, f64>> {
    load_score_map(conn, "SELECT client_code, score FROM client_scores", "client_scores")
}

pub fn load_label_scores(conn: &Connection) -> Result<HashMap<String, f64>> {
    load_score_map(conn, "SELECT label, score FROM label_scores", "label_scores")
}

pub fn load_category_weights(conn: &Connection) -> Result<CategoryWeights> {
    let mut stmt = conn.prepare("SELECT name, weight FROM categories")?;
    let mut rows = stmt.query([])?;
    let mut weights = CategoryWeights::default();

    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        match coerce_score(row.get_ref(1)?).filter(|w| *w >= 0.0) {
            Some(weight) => weights.insert(name, weight),
            None => log::warn!("ignoring invalid weight for category '{name}'"),
        }
    }

    if weights.get("Urgencia").is_some() {
        log::warn!("category 'Urgencia' is not recognised; the scored key is 'Urgência'");
    }

    Ok(weights)
}

impl ClassificationSource for Connection {
    fn client_scores(&self) -> EngineResult<HashMap<String, f64>> {
        Ok(load_client_scores(self)?)
    }

    fn label_scores(&self) -> EngineResult<HashMap<String, f64>> {
        Ok(load_label_scores(self)?)
    }

    fn category_weights(&self) -> EngineResult<CategoryWeights> {
        Ok(load_category_weights(self)?)
    }
}

impl IssueGraph for Connection {
    fn resolve_ticket_number(&self, ticket_number: i64) -> EngineResult<Option<i64>> {
        Ok(self
            .query_row(
                "SELECT id FROM issues WHERE ticket_number = ?1 ORDER BY id LIMIT 1",
                params![ticket_number],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn find_issue(&self, id: i64) -> EngineResult<Option<Issue>> {
        Ok(load_issue(self, id)?)
    }

    fn successor_ids(&self, id: i64) -> EngineResult<Vec<i64>> {
        let mut stmt =
            self.prepare("SELECT destination_id FROM issue_links WHERE origin_id = ?1")?;
        let ids = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<Result<Vec<i64>>>()?;
        Ok(ids)
    }

    fn find_issues(&self, ids: &[i64]) -> EngineResult<Vec<Issue>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE active = 1 AND id IN ({placeholders}) ORDER BY due_date IS NULL, due_date ASC, id ASC"
        );
        let mut stmt = self.prepare(&sql)?;
        let issues = stmt
            .query_map(params_from_iter(ids.iter()), issue_from_row)?
            .collect::<Result<Vec<Issue>>>()?;
        Ok(issues)
    }
}

fn parse_stored_date(raw: Option<String>) -> Option<NaiveDate> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.with_timezone(&chrono::Local).date_naive())
        })
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        });

    if parsed.is_none() {
        log::warn!("ignoring malformed stored date '{trimmed}'");
    }
    parsed
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn issue_from_row(row: &Row<'_>) -> Result<Issue> {
    let labels_json: String = row.get(6)?;
    let labels: Vec<String> = serde_json::from_str(&labels_json).unwrap_or_default();
    let status: String = row.get(7)?;
    let responsible: String = row.get(11)?;

    Ok(Issue {
        id: row.get(0)?,
        ticket_number: row.get(1)?,
        title: row.get(2)?,
        project: row.get(3)?,
        repository: row.get(4)?,
        client_code: row.get(5)?,
        labels,
        status: IssueStatus::parse(&status),
        opened_at: parse_stored_date(row.get(8)?),
        due_date: parse_stored_date(row.get(9)?),
        closed_at: parse_stored_date(row.get(10)?),
        responsible: if responsible.trim().is_empty() {
            "Indefinido".to_string()
        } else {
            responsible
        },
        link: row.get(12)?,
    })
}

pub fn load_issue(conn: &Connection, id: i64) -> Result<Option<Issue>> {
    conn.query_row(
        &format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1 AND active = 1"),
        params![id],
        issue_from_row,
    )
    .optional()
}

/// Open, active issues matching `filter`, by due date ascending (nulls last).
pub fn load_open_issues(conn: &Connection, filter: &IssueFilter) -> Result<Vec<Issue>> {
    let sql = format!(
        "SELECT {ISSUE_COLUMNS} FROM issues
         WHERE status = 'opened' AND active = 1
           AND (?1 IS NULL OR project = ?1)
           AND (?2 IS NULL OR opened_at >= ?2)
           AND (?3 IS NULL OR opened_at <= ?3)
         ORDER BY due_date IS NULL, due_date ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let issues = stmt
        .query_map(
            params![
                filter.project.as_deref(),
                format_date(filter.opened_from),
                format_date(filter.opened_to)
            ],
            issue_from_row,
        )?
        .collect::<Result<Vec<Issue>>>()?;
    Ok(issues)
}

/// Active issues opened or closed inside the inclusive period. Both bounds
/// must be present for the period to apply.
pub fn load_issues_in_period(
    conn: &Connection,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<Issue>> {
    let (from, to) = match (from, to) {
        (Some(from), Some(to)) => (format_date(Some(from)), format_date(Some(to))),
        _ => (None, None),
    };
    let sql = format!(
        "SELECT {ISSUE_COLUMNS} FROM issues
         WHERE active = 1
           AND (?1 IS NULL
                OR (opened_at BETWEEN ?1 AND ?2)
                OR (closed_at BETWEEN ?1 AND ?2))
         ORDER BY project ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let issues = stmt
        .query_map(params![from, to], issue_from_row)?
        .collect::<Result<Vec<Issue>>>()?;
    Ok(issues)
}

pub fn upsert_issues(conn: &Connection, issues: &[Issue]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for issue in issues {
        upsert_issue_with_conn(&tx, issue)?;
    }
    tx.commit()
}

fn upsert_issue_with_conn(conn: &Connection, issue: &Issue) -> Result<()> {
    let labels_json = serde_json::to_string(&issue.labels).unwrap_or_else(|_| "[]".to_string());

    conn.execute(
        "
        INSERT INTO issues (
            id, ticket_number, title, project, repository, client_code, labels,
            status, opened_at, due_date, closed_at, responsible, link, active
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 1)
        ON CONFLICT(id) DO UPDATE SET
            ticket_number = excluded.ticket_number,
            title = excluded.title,
            project = excluded.project,
            repository = excluded.repository,
            client_code = excluded.client_code,
            labels = excluded.labels,
            status = excluded.status,
            opened_at = excluded.opened_at,
            due_date = excluded.due_date,
            closed_at = excluded.closed_at,
            responsible = excluded.responsible,
            link = excluded.link,
            active = 1
        ",
        params![
            issue.id,
            issue.ticket_number,
            issue.title,
            issue.project,
            issue.repository,
            issue.client_code,
            labels_json,
            issue.status.as_str(),
            format_date(issue.opened_at),
            format_date(issue.due_date),
            format_date(issue.closed_at),
            issue.responsible,
            issue.link,
        ],
    )?;

    Ok(())
}

pub fn link_issues(conn: &Connection, edges: &[SuccessorEdge]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for edge in edges {
        tx.execute(
            "INSERT OR IGNORE INTO issue_links (origin_id, destination_id) VALUES (?1, ?2)",
            params![edge.origin_id, edge.destination_id],
        )?;
    }
    tx.commit()
}

pub async fn category_crud(
    data_dir: String,
    operation: String,
    item: Option<CategoryRecord>,
    name: Option<String>,
) -> EngineResult<serde_json::Value> {
    let conn = get_db_connection(&data_dir)?;

    match operation.as_str() {
        "create" => {
            let item = validated_category(item)?;
            conn.execute(
                "INSERT INTO categories (name, weight) VALUES (?1, ?2)",
                params![&item.name, item.weight],
            )?;
            log::info!("created category '{}' with weight {}", item.name, item.weight);
            Ok(serde_json::json!({"status": "created", "name": item.name}))
        }
        "update" => {
            let item = validated_category(item)?;
            let changed = conn.execute(
                "UPDATE categories SET weight = ?2 WHERE name = ?1",
                params![&item.name, item.weight],
            )?;
            if changed == 0 {
                return Err(EngineError::CategoryNotFound(item.name));
            }
            log::info!("updated category '{}' to weight {}", item.name, item.weight);
            Ok(serde_json::json!({"status": "updated", "name": item.name}))
        }
        "read" => {
            let name = name.ok_or_else(|| EngineError::InvalidInput("name required for read".into()))?;
            let item = conn
                .query_row(
                    "SELECT name, weight FROM categories WHERE name = ?1",
                    params![name],
                    category_from_row,
                )
                .optional()?;
            Ok(serde_json::to_value(item).unwrap_or(serde_json::Value::Null))
        }
        "list" => {
            let mut stmt = conn.prepare("SELECT name, weight FROM categories ORDER BY name ASC")?;
            let items: Vec<CategoryRecord> = stmt
                .query_map([], category_from_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(serde_json::to_value(items).unwrap_or_default())
        }
        "delete" => {
            let name = name.ok_or_else(|| EngineError::InvalidInput("name required for delete".into()))?;
            let changed = conn.execute("DELETE FROM categories WHERE name = ?1", params![name])?;
            if changed == 0 {
                return Err(EngineError::CategoryNotFound(name));
            }
            log::info!("deleted category '{name}'");
            Ok(serde_json::json!({"status": "deleted", "name": name}))
        }
        _ => Err(EngineError::InvalidInput(format!("unknown operation: {operation}"))),
    }
}

fn category_from_row(row: &Row<'_>) -> Result<CategoryRecord> {
    Ok(CategoryRecord {
        name: row.get(0)?,
        weight: coerce_score(row.get_ref(1)?).unwrap_or(0.0),
    })
}

fn validated_category(item: Option<CategoryRecord>) -> EngineResult<CategoryRecord> {
    let item = item.ok_or_else(|| EngineError::InvalidInput("category required".into()))?;
    if item.name.trim().is_empty() {
        return Err(EngineError::InvalidInput("category name must not be empty".into()));
    }
    if !item.weight.is_finite() || item.weight < 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "weight for '{}' must be a non-negative number",
            item.name
        )));
    }
    Ok(CategoryRecord {
        name: item.name.trim().to_string(),
        weight: item.weight,
    })
}

/// Storage location of a classification category.
struct ClassificationTable {
    table: &'static str,
    key_column: &'static str,
    description_column: &'static str,
}

fn classification_table(category: &str) -> EngineResult<ClassificationTable> {
    match Category::from_name(category) {
        Some(Category::Cliente) => Ok(ClassificationTable {
            table: "client_scores",
            key_column: "client_code",
            description_column: "description",
        }),
        Some(Category::Prazo) => Ok(ClassificationTable {
            table: "deadline_buckets",
            key_column: "classification",
            description_column: "days",
        }),
        Some(_) => Ok(ClassificationTable {
            table: "label_scores",
            key_column: "label",
            description_column: "description",
        }),
        None => Err(EngineError::InvalidInput(format!("invalid category: {category}"))),
    }
}

/// Collapse any `/` (and surrounding blanks) inside a classification value
/// into a single space.
fn normalize_classification(raw: &str) -> String {
    raw.trim()
        .split('/')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}

fn storage_key(category: &str, classification: &str) -> String {
    let value = normalize_classification(classification);
    match Category::from_name(category) {
        Some(c) if Category::LABELED.contains(&c) => {
            crate::analysis::labels::label_key(c.name(), &value)
        }
        _ => value,
    }
}

fn parse_payload_score(raw: &Option<serde_json::Value>) -> EngineResult<Option<f64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let parsed = match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed.filter(|v| v.is_finite()) {
        Some(score) => Ok(Some(score)),
        None => Err(EngineError::InvalidInput("score must be a valid number".into())),
    }
}

fn read_classification(
    conn: &Connection,
    category: &str,
    target: &ClassificationTable,
    key: &str,
) -> Result<Option<ClassificationRecord>> {
    conn.query_row(
        &format!(
            "SELECT {}, {}, score FROM {} WHERE {} = ?1",
            target.key_column, target.description_column, target.table, target.key_column
        ),
        params![key],
        |row| classification_from_row(category, row),
    )
    .optional()
}

fn classification_from_row(category: &str, row: &Row<'_>) -> Result<ClassificationRecord> {
    Ok(ClassificationRecord {
        category: category.to_string(),
        key: row.get(0)?,
        description: row.get(1)?,
        score: coerce_score(row.get_ref(2)?),
    })
}

pub async fn classification_crud(
    data_dir: String,
    operation: String,
    category: String,
    classification: Option<String>,
    payload: Option<ClassificationPayload>,
) -> EngineResult<serde_json::Value> {
    let category = category.trim().to_string();
    let target = classification_table(&category)?;
    let conn = get_db_connection(&data_dir)?;

    match operation.as_str() {
        "list" => {
            let mut sql = format!(
                "SELECT {}, {}, score FROM {}",
                target.key_column, target.description_column, target.table
            );
            let mut filters: Vec<String> = Vec::new();
            if target.table == "label_scores" {
                sql.push_str(" WHERE label LIKE ?1");
                filters.push(format!("{category} /%"));
            }
            sql.push_str(&format!(" ORDER BY {} ASC", target.key_column));

            let mut stmt = conn.prepare(&sql)?;
            let items: Vec<ClassificationRecord> = stmt
                .query_map(params_from_iter(filters.iter()), |row| {
                    classification_from_row(&category, row)
                })?
                .filter_map(|r| r.ok())
                .collect();
            Ok(serde_json::to_value(items).unwrap_or_default())
        }
        "read" => {
            let key = classification_key(&category, classification)?;
            let item = read_classification(&conn, &category, &target, &key)?;
            Ok(serde_json::to_value(item).unwrap_or(serde_json::Value::Null))
        }
        "create" | "update" => {
            let key = classification_key(&category, classification)?;
            let payload = payload.unwrap_or_default();
            let score = parse_payload_score(&payload.score)?;
            if payload.description.is_none() && score.is_none() {
                return Err(EngineError::InvalidInput(
                    "send at least one of description or score".into(),
                ));
            }

            if operation == "create" {
                conn.execute(
                    &format!(
                        "INSERT INTO {} ({}, {}, score) VALUES (?1, ?2, ?3)",
                        target.table, target.key_column, target.description_column
                    ),
                    params![&key, payload.description.as_deref(), score],
                )?;
                log::info!("created classification '{key}' in {category}");
            } else {
                let changed = conn.execute(
                    &format!(
                        "UPDATE {table} SET {desc} = COALESCE(?2, {desc}), score = COALESCE(?3, score) WHERE {key_col} = ?1",
                        table = target.table,
                        desc = target.description_column,
                        key_col = target.key_column
                    ),
                    params![&key, payload.description.as_deref(), score],
                )?;
                if changed == 0 {
                    return Err(EngineError::ClassificationNotFound(key));
                }
                log::info!("updated classification '{key}' in {category}");
            }

            let item = read_classification(&conn, &category, &target, &key)?;
            Ok(serde_json::to_value(item).unwrap_or(serde_json::Value::Null))
        }
        "delete" => {
            let key = classification_key(&category, classification)?;
            let changed = conn.execute(
                &format!("DELETE FROM {} WHERE {} = ?1", target.table, target.key_column),
                params![&key],
            )?;
            if changed == 0 {
                return Err(EngineError::ClassificationNotFound(key));
            }
            Ok(serde_json::json!({"status": "deleted", "key": key}))
        }
        _ => Err(EngineError::InvalidInput(format!("unknown operation: {operation}"))),
    }
}

fn classification_key(category: &str, classification: Option<String>) -> EngineResult<String> {
    let raw = classification
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| EngineError::InvalidInput("classification required".into()))?;
    Ok(storage_key(category, &raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        initialize_schema(&conn).expect("schema init");
        conn
    }

    fn issue(id: i64, project: &str, status: IssueStatus, due: Option<&str>) -> Issue {
        Issue {
            id,
            ticket_number: id + 500,
            title: format!("issue {id}"),
            project: project.to_string(),
            repository: "core".to_string(),
            client_code: "ACME".to_string(),
            labels: vec!["Urgência / Alto".to_string()],
            status,
            opened_at: NaiveDate::from_ymd_opt(2025, 1, id as u32),
            due_date: due.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").expect("date")),
            closed_at: None,
            responsible: String::new(),
            link: String::new(),
        }
    }

    #[test]
    fn schema_initializes_with_expected_version() {
        let conn = memory_db();
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("schema version");
        assert_eq!(version, DB_SCHEMA_VERSION);
    }

    #[test]
    fn default_categories_are_seeded() {
        let conn = memory_db();
        let weights = load_category_weights(&conn).expect("weights");
        for (category, weight) in DEFAULT_CATEGORY_WEIGHTS {
            assert_eq!(weights.get(category.name()), Some(weight));
        }
    }

    #[test]
    fn corrupt_scores_are_treated_as_absent() {
        let conn = memory_db();
        conn.execute_batch(
            "INSERT INTO client_scores (client_code, score) VALUES ('ACME', '8.5');
             INSERT INTO client_scores (client_code, score) VALUES ('BETA', 'n/a');
             INSERT INTO client_scores (client_code, score) VALUES ('GAMA', 4);
             INSERT INTO client_scores (client_code, score) VALUES ('DELTA', NULL);",
        )
        .expect("seed clients");

        let scores = load_client_scores(&conn).expect("client scores");
        assert_eq!(scores.get("ACME"), Some(&8.5));
        assert_eq!(scores.get("GAMA"), Some(&4.0));
        assert!(!scores.contains_key("BETA"));
        assert!(!scores.contains_key("DELTA"));
    }

    #[test]
    fn negative_weights_are_skipped() {
        let conn = memory_db();
        conn.execute("UPDATE categories SET weight = -10 WHERE name = 'Prazo'", [])
            .expect("update weight");
        let weights = load_category_weights(&conn).expect("weights");
        assert_eq!(weights.get("Prazo"), None);
        assert_eq!(weights.weight_for(Category::Prazo), 30.0);
    }

    #[test]
    fn issue_round_trip_preserves_labels_and_dates() {
        let conn = memory_db();
        let original = issue(3, "QA", IssueStatus::Opened, Some("2025-02-14"));
        upsert_issues(&conn, &[original.clone()]).expect("upsert");

        let loaded = load_issue(&conn, 3).expect("load").expect("exists");
        assert_eq!(loaded.labels, original.labels);
        assert_eq!(loaded.due_date, original.due_date);
        assert_eq!(loaded.status, IssueStatus::Opened);
        assert_eq!(loaded.responsible, "Indefinido");
    }

    #[test]
    fn open_issue_query_orders_by_due_date_with_nulls_last() {
        let conn = memory_db();
        upsert_issues(
            &conn,
            &[
                issue(1, "QA", IssueStatus::Opened, None),
                issue(2, "QA", IssueStatus::Opened, Some("2025-03-01")),
                issue(3, "QA", IssueStatus::Opened, Some("2025-02-01")),
                issue(4, "QA", IssueStatus::Closed, Some("2025-01-01")),
                issue(5, "CMO", IssueStatus::Opened, Some("2025-01-01")),
            ],
        )
        .expect("upsert");

        let filter = IssueFilter {
            project: Some("QA".to_string()),
            ..IssueFilter::default()
        };
        let ids: Vec<i64> = load_open_issues(&conn, &filter)
            .expect("query")
            .iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let ranged = IssueFilter {
            project: None,
            opened_from: NaiveDate::from_ymd_opt(2025, 1, 2),
            opened_to: NaiveDate::from_ymd_opt(2025, 1, 3),
        };
        let ids: Vec<i64> = load_open_issues(&conn, &ranged)
            .expect("query")
            .iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn inactive_issues_are_not_graph_nodes() {
        let conn = memory_db();
        upsert_issues(&conn, &[issue(1, "QA", IssueStatus::Opened, None)]).expect("upsert");
        conn.execute("UPDATE issues SET active = 0 WHERE id = 1", [])
            .expect("deactivate");
        assert!(conn.find_issue(1).expect("find").is_none());
        assert_eq!(conn.resolve_ticket_number(501).expect("resolve"), Some(1));
    }

    #[test]
    fn classification_keys_collapse_slashes() {
        assert_eq!(storage_key("Urgência", " Muito / Alto "), "Urgência / Muito Alto");
        assert_eq!(storage_key("Cliente", "ACME"), "ACME");
        assert_eq!(normalize_classification("a//b"), "a  b");
    }

    #[test]
    fn payload_score_accepts_numeric_text_only() {
        assert_eq!(parse_payload_score(&None).expect("none"), None);
        assert_eq!(
            parse_payload_score(&Some(serde_json::json!("7.5"))).expect("text"),
            Some(7.5)
        );
        assert!(parse_payload_score(&Some(serde_json::json!("alto"))).is_err());
        assert!(parse_payload_score(&Some(serde_json::json!(true))).is_err());
    }
}
