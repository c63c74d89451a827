use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

use civicbot_common::{
    Department, GeoPoint, IssueType, NewReport, Priority, Report, ReportStatus,
};

use crate::store::{DashboardStats, ReportFilter, ReportStore, Result, StoreError};

/// SQLite-backed report store. Enums are stored as their snake_case text
/// form; timestamps as RFC 3339 text (sqlx's chrono encoding), which keeps
/// range comparisons lexicographically correct.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .create_if_missing(true);

        // An in-memory database lives and dies with its connection, so the
        // pool must hold exactly one and never recycle it.
        let in_memory = database_url.contains(":memory:");
        let mut pool_options =
            SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            pool_options = pool_options
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }

        let pool = pool_options.connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Create the schema if it does not exist. Idempotent.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                reporter_id     TEXT NOT NULL,
                issue_type      TEXT NOT NULL,
                description     TEXT NOT NULL,
                location_text   TEXT NOT NULL,
                latitude        REAL,
                longitude       REAL,
                image_reference TEXT,
                department      TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'received',
                priority        TEXT NOT NULL DEFAULT 'medium',
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                resolved_at     TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for index_sql in [
            "CREATE INDEX IF NOT EXISTS idx_reports_status ON reports(status)",
            "CREATE INDEX IF NOT EXISTS idx_reports_issue_type ON reports(issue_type)",
            "CREATE INDEX IF NOT EXISTS idx_reports_department ON reports(department)",
            "CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports(created_at)",
        ] {
            sqlx::query(index_sql).execute(&self.pool).await?;
        }

        info!("Report schema ready");
        Ok(())
    }
}

const REPORT_COLUMNS: &str = "id, reporter_id, issue_type, description, location_text, \
     latitude, longitude, image_reference, department, status, priority, \
     created_at, updated_at, resolved_at";

fn report_from_row(row: &SqliteRow) -> std::result::Result<Report, sqlx::Error> {
    let lat: Option<f64> = row.try_get("latitude")?;
    let lng: Option<f64> = row.try_get("longitude")?;
    let coordinates = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        _ => None,
    };

    Ok(Report {
        id: row.try_get("id")?,
        reporter_id: row.try_get("reporter_id")?,
        issue_type: IssueType::from_str_loose(row.try_get::<String, _>("issue_type")?.as_str()),
        description: row.try_get("description")?,
        location_text: row.try_get("location_text")?,
        coordinates,
        image_reference: row.try_get("image_reference")?,
        department: Department::from_str_loose(row.try_get::<String, _>("department")?.as_str()),
        status: ReportStatus::from_str_loose(row.try_get::<String, _>("status")?.as_str()),
        priority: Priority::from_str_loose(row.try_get::<String, _>("priority")?.as_str()),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        resolved_at: row.try_get("resolved_at")?,
    })
}

/// WHERE clause and bind order shared by the list and count queries.
fn filter_clause(filter: &ReportFilter) -> String {
    let mut conditions = Vec::new();
    if filter.status.is_some() {
        conditions.push("status = ?");
    }
    if filter.issue_type.is_some() {
        conditions.push("issue_type = ?");
    }
    if filter.department.is_some() {
        conditions.push("department = ?");
    }
    if filter.search.is_some() {
        conditions.push("(description LIKE ? OR location_text LIKE ?)");
    }

    if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    }
}

fn bind_filters<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    filter: &ReportFilter,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(status) = filter.status {
        query = query.bind(status.to_string());
    }
    if let Some(issue_type) = filter.issue_type {
        query = query.bind(issue_type.to_string());
    }
    if let Some(department) = filter.department {
        query = query.bind(department.to_string());
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        query = query.bind(pattern.clone()).bind(pattern);
    }
    query
}

#[async_trait]
impl ReportStore for SqliteStore {
    async fn create(&self, new: NewReport) -> Result<i64> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO reports (reporter_id, issue_type, description, location_text,
                                 latitude, longitude, image_reference, department,
                                 status, priority, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&new.reporter_id)
        .bind(new.issue_type.to_string())
        .bind(&new.description)
        .bind(&new.location_text)
        .bind(new.coordinates.map(|c| c.lat))
        .bind(new.coordinates.map(|c| c.lng))
        .bind(&new.image_reference)
        .bind(new.department.to_string())
        .bind(ReportStatus::Received.to_string())
        .bind(new.priority.to_string())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn get(&self, id: i64) -> Result<Option<Report>> {
        let row = sqlx::query(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| report_from_row(&r)).transpose().map_err(Into::into)
    }

    async fn list(
        &self,
        filter: &ReportFilter,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Report>, u64)> {
        let where_clause = filter_clause(filter);
        let offset = (page.max(1) as i64 - 1) * page_size as i64;

        let list_sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE {where_clause} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let rows = bind_filters(sqlx::query(&list_sql), filter)
            .bind(page_size as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let mut reports = Vec::with_capacity(rows.len());
        for row in &rows {
            reports.push(report_from_row(row)?);
        }

        let count_sql = format!("SELECT COUNT(*) FROM reports WHERE {where_clause}");
        let total: i64 = bind_filters(sqlx::query(&count_sql), filter)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        Ok((reports, total as u64))
    }

    async fn update_status(&self, id: i64, new_status: ReportStatus) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status, resolved_at FROM reports WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(false);
        };

        let current = ReportStatus::from_str_loose(row.try_get::<String, _>("status")?.as_str());
        if !current.can_transition_to(new_status) {
            warn!(report_id = id, from = %current, to = %new_status, "Rejected status transition");
            return Ok(false);
        }

        let resolved_at: Option<DateTime<Utc>> = row.try_get("resolved_at")?;
        let now = Utc::now();

        if new_status == ReportStatus::Resolved && resolved_at.is_none() {
            sqlx::query("UPDATE reports SET status = ?, updated_at = ?, resolved_at = ? WHERE id = ?")
                .bind(new_status.to_string())
                .bind(now)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("UPDATE reports SET status = ?, updated_at = ? WHERE id = ?")
                .bind(new_status.to_string())
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn set_priority(&self, id: i64, priority: Priority) -> Result<bool> {
        let result = sqlx::query("UPDATE reports SET priority = ?, updated_at = ? WHERE id = ?")
            .bind(priority.to_string())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<DashboardStats> {
        let mut stats = DashboardStats::default();

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await?;
        stats.total = total as u64;

        let (resolved,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM reports WHERE status = 'resolved'")
                .fetch_one(&self.pool)
                .await?;
        stats.resolved = resolved as u64;

        let (with_image,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM reports WHERE image_reference IS NOT NULL AND image_reference != ''",
        )
        .fetch_one(&self.pool)
        .await?;
        stats.with_image = with_image as u64;

        let by_status: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM reports GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        stats.status_distribution = by_status.into_iter().map(|(k, v)| (k, v as u64)).collect();

        let by_issue: Vec<(String, i64)> =
            sqlx::query_as("SELECT issue_type, COUNT(*) FROM reports GROUP BY issue_type")
                .fetch_all(&self.pool)
                .await?;
        stats.issue_type_distribution =
            by_issue.into_iter().map(|(k, v)| (k, v as u64)).collect();

        let by_department: Vec<(String, i64)> =
            sqlx::query_as("SELECT department, COUNT(*) FROM reports GROUP BY department")
                .fetch_all(&self.pool)
                .await?;
        stats.department_distribution = by_department
            .into_iter()
            .map(|(k, v)| (k, v as u64))
            .collect();

        let week_ago = Utc::now() - chrono::Duration::days(7);
        let (recent,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reports WHERE created_at >= ?")
            .bind(week_ago)
            .fetch_one(&self.pool)
            .await?;
        stats.reports_last_7_days = recent as u64;

        // Averaged in Rust rather than SQL so the TEXT timestamp encoding
        // never feeds date arithmetic.
        let spans: Vec<(DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            "SELECT created_at, resolved_at FROM reports WHERE resolved_at IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;
        if !spans.is_empty() {
            let total_days: f64 = spans
                .iter()
                .map(|(created, resolved)| (*resolved - *created).num_seconds() as f64 / 86_400.0)
                .sum();
            stats.avg_resolution_days = total_days / spans.len() as f64;
        }

        Ok(stats)
    }

    async fn archive_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE reports SET status = 'archived', updated_at = ? \
             WHERE status = 'resolved' AND created_at < ?",
        )
        .bind(Utc::now())
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
