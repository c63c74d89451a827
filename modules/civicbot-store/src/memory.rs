use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use civicbot_common::{NewReport, Priority, Report, ReportStatus};

use crate::store::{DashboardStats, ReportFilter, ReportStore, Result};

/// In-memory report store. Backs the test suites and ephemeral deployments;
/// identical contract to `SqliteStore`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    reports: BTreeMap<i64, Report>,
    last_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(report: &Report, filter: &ReportFilter) -> bool {
    if filter.status.is_some_and(|s| s != report.status) {
        return false;
    }
    if filter.issue_type.is_some_and(|t| t != report.issue_type) {
        return false;
    }
    if filter.department.is_some_and(|d| d != report.department) {
        return false;
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let haystack_hit = report.description.to_lowercase().contains(&needle)
            || report.location_text.to_lowercase().contains(&needle);
        if !haystack_hit {
            return false;
        }
    }
    true
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn create(&self, new: NewReport) -> Result<i64> {
        let mut inner = self.inner.write().expect("report store lock poisoned");
        inner.last_id += 1;
        let id = inner.last_id;
        let now = Utc::now();

        inner.reports.insert(
            id,
            Report {
                id,
                reporter_id: new.reporter_id,
                issue_type: new.issue_type,
                description: new.description,
                location_text: new.location_text,
                coordinates: new.coordinates,
                image_reference: new.image_reference,
                department: new.department,
                status: ReportStatus::Received,
                priority: new.priority,
                created_at: now,
                updated_at: now,
                resolved_at: None,
            },
        );

        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<Report>> {
        let inner = self.inner.read().expect("report store lock poisoned");
        Ok(inner.reports.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &ReportFilter,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Report>, u64)> {
        let inner = self.inner.read().expect("report store lock poisoned");

        let mut hits: Vec<Report> = inner
            .reports
            .values()
            .filter(|r| matches(r, filter))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = hits.len() as u64;
        let offset = (page.max(1) - 1) as usize * page_size as usize;
        let reports = hits
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        Ok((reports, total))
    }

    async fn update_status(&self, id: i64, new_status: ReportStatus) -> Result<bool> {
        let mut inner = self.inner.write().expect("report store lock poisoned");
        let Some(report) = inner.reports.get_mut(&id) else {
            return Ok(false);
        };

        if !report.status.can_transition_to(new_status) {
            warn!(
                report_id = id,
                from = %report.status,
                to = %new_status,
                "Rejected status transition"
            );
            return Ok(false);
        }

        report.status = new_status;
        report.updated_at = Utc::now();
        if new_status == ReportStatus::Resolved && report.resolved_at.is_none() {
            report.resolved_at = Some(report.updated_at);
        }

        Ok(true)
    }

    async fn set_priority(&self, id: i64, priority: Priority) -> Result<bool> {
        let mut inner = self.inner.write().expect("report store lock poisoned");
        let Some(report) = inner.reports.get_mut(&id) else {
            return Ok(false);
        };

        report.priority = priority;
        report.updated_at = Utc::now();
        Ok(true)
    }

    async fn stats(&self) -> Result<DashboardStats> {
        let inner = self.inner.read().expect("report store lock poisoned");
        let week_ago = Utc::now() - chrono::Duration::days(7);

        let mut stats = DashboardStats {
            total: inner.reports.len() as u64,
            ..Default::default()
        };

        let mut resolution_days = Vec::new();
        for report in inner.reports.values() {
            if report.status == ReportStatus::Resolved {
                stats.resolved += 1;
            }
            if report.image_reference.is_some() {
                stats.with_image += 1;
            }
            if report.created_at >= week_ago {
                stats.reports_last_7_days += 1;
            }

            *stats
                .status_distribution
                .entry(report.status.to_string())
                .or_insert(0) += 1;
            *stats
                .issue_type_distribution
                .entry(report.issue_type.to_string())
                .or_insert(0) += 1;
            *stats
                .department_distribution
                .entry(report.department.to_string())
                .or_insert(0) += 1;

            if let Some(resolved_at) = report.resolved_at {
                let days = (resolved_at - report.created_at).num_seconds() as f64 / 86_400.0;
                resolution_days.push(days);
            }
        }

        if !resolution_days.is_empty() {
            stats.avg_resolution_days =
                resolution_days.iter().sum::<f64>() / resolution_days.len() as f64;
        }

        Ok(stats)
    }

    async fn archive_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.write().expect("report store lock poisoned");
        let now = Utc::now();
        let mut archived = 0;

        for report in inner.reports.values_mut() {
            if report.status == ReportStatus::Resolved && report.created_at < cutoff {
                report.status = ReportStatus::Archived;
                report.updated_at = now;
                archived += 1;
            }
        }

        Ok(archived)
    }
}
