// crates/brewlog-records/src/analytics.rs
// ============================================================================
// Module: Analytics
// Description: Read-only summaries over a caller's visible batches.
// Purpose: Report batch timelines, reading series, quality and production.
// Dependencies: brewlog-core, serde
// ============================================================================

//! ## Overview
//! Analytics never write. Every figure is computed from the batches, stage
//! logs, measurement logs and quality logs visible to the requesting caller,
//! so two callers may see different numbers for the same range.

use std::collections::BTreeMap;

use brewlog_core::Caller;
use brewlog_core::RecordId;
use brewlog_core::StoreContext;
use brewlog_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

use crate::batch::Batch;
use crate::batch::BatchRepository;
use crate::batch::BatchStage;
use crate::batch::Measurement;
use crate::batch::MeasurementKind;
use crate::batch::StageEntry;
use crate::error::RecordsError;
use crate::quality::CheckStatus;
use crate::quality::CheckType;
use crate::quality::QualityCheck;
use crate::quality::QualityRepository;

/// Number of failing check types reported by [`Analytics::quality_metrics`].
pub const TOP_ISSUES: usize = 5;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// First included instant.
    pub start: Timestamp,
    /// Last included instant.
    pub end: Timestamp,
}

impl TimeRange {
    /// Creates a window from `start` to `end`, both included.
    #[must_use]
    pub const fn new(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start,
            end,
        }
    }

    /// Returns true when `instant` falls inside the window.
    #[must_use]
    pub fn contains(self, instant: Timestamp) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Timeline and logs of one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetrics {
    /// Batch id.
    pub batch_id: RecordId,
    /// Batch name.
    pub name: String,
    /// Brew start.
    pub start: Timestamp,
    /// End of the last stage, when it has ended.
    pub end: Option<Timestamp>,
    /// Milliseconds from start to end, or to now for running batches.
    pub duration_ms: i64,
    /// Stage entries ordered by start.
    pub stages: Vec<StageEntry>,
    /// Readings ordered by time.
    pub measurements: Vec<Measurement>,
    /// Quality checks ordered by time.
    pub quality_checks: Vec<QualityCheck>,
}

/// One reading in a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    /// Reading time.
    pub timestamp: Timestamp,
    /// Reading value.
    pub value: f64,
}

/// Reading series of one batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PerformanceData {
    /// Acidity readings ordered by time.
    pub ph: Vec<DataPoint>,
    /// Temperature readings ordered by time.
    pub temperature: Vec<DataPoint>,
}

/// Failure count of one check type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IssueCount {
    /// Check type.
    pub kind: CheckType,
    /// Failed checks of that type.
    pub count: usize,
}

/// Quality summary over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// Checks in the window.
    pub total_checks: usize,
    /// Checks that passed.
    pub passed_checks: usize,
    /// Checks that failed. Warnings count toward neither.
    pub failed_checks: usize,
    /// Passed checks as a percentage of all checks; 0 when there are none.
    pub pass_rate: f64,
    /// Most frequently failing check types, most frequent first.
    pub common_issues: Vec<IssueCount>,
}

/// Production summary over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionMetrics {
    /// Batches started in the window.
    pub total_batches: usize,
    /// Of those, batches that are completed.
    pub completed_batches: usize,
    /// Mean duration in milliseconds; 0 when there are no batches.
    pub average_batch_duration_ms: f64,
    /// Summed volume in liters.
    pub total_volume: f64,
    /// Stage count per equipment id.
    pub equipment_utilization: BTreeMap<String, usize>,
}

// ============================================================================
// SECTION: Analytics
// ============================================================================

/// Read-only analytics over batches and their logs.
#[derive(Debug, Clone)]
pub struct Analytics {
    /// Context supplying the clock.
    context: StoreContext,
    /// Batches with their stage and measurement logs.
    batches: BatchRepository,
    /// Quality checks.
    quality: QualityRepository,
}

impl Analytics {
    /// Builds analytics over the given repositories.
    #[must_use]
    pub fn new(
        context: &StoreContext,
        batches: BatchRepository,
        quality: QualityRepository,
    ) -> Self {
        Self {
            context: context.clone(),
            batches,
            quality,
        }
    }

    /// Returns the timeline and logs of batch `batch_id`, or `None` when the
    /// batch is not visible.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when a read fails.
    pub async fn batch_metrics(
        &self,
        batch_id: &RecordId,
        caller: &Caller,
    ) -> Result<Option<BatchMetrics>, RecordsError> {
        let Some(batch) = self.batches.get(batch_id, caller).await? else {
            return Ok(None);
        };
        let stages = self.batches.stages(batch_id, caller).await?;
        let measurements = self.batches.measurements(batch_id, caller).await?;
        let quality_checks = self.quality.checks(batch_id, caller).await?;
        let start = batch.started_at();
        let end = last_stage_end(&stages);
        Ok(Some(BatchMetrics {
            batch_id: batch.id,
            name: batch.name,
            start,
            end,
            duration_ms: end.unwrap_or_else(|| self.context.clock().now()).millis_since(start),
            stages,
            measurements,
            quality_checks,
        }))
    }

    /// Returns the ph and temperature readings of batch `batch_id` inside
    /// `range`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the batch is not visible or a read fails.
    pub async fn performance_data(
        &self,
        batch_id: &RecordId,
        range: TimeRange,
        caller: &Caller,
    ) -> Result<PerformanceData, RecordsError> {
        let readings = self.batches.measurements(batch_id, caller).await?;
        let series = |kind: MeasurementKind| {
            readings
                .iter()
                .filter(|reading| reading.kind == kind && range.contains(reading.timestamp))
                .map(|reading| DataPoint {
                    timestamp: reading.timestamp,
                    value: reading.value,
                })
                .collect::<Vec<_>>()
        };
        Ok(PerformanceData {
            ph: series(MeasurementKind::Ph),
            temperature: series(MeasurementKind::Temperature),
        })
    }

    /// Summarizes the quality checks inside `range` across visible batches.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when a read fails.
    pub async fn quality_metrics(
        &self,
        range: TimeRange,
        caller: &Caller,
    ) -> Result<QualityMetrics, RecordsError> {
        let mut checks = Vec::new();
        for batch in self.batches.list(caller).await? {
            let batch_checks = self.quality.checks(&batch.id, caller).await?;
            checks.extend(batch_checks.into_iter().filter(|check| range.contains(check.timestamp)));
        }
        Ok(summarize_checks(&checks))
    }

    /// Summarizes the visible batches that started inside `range`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when a read fails.
    pub async fn production_metrics(
        &self,
        range: TimeRange,
        caller: &Caller,
    ) -> Result<ProductionMetrics, RecordsError> {
        let now = self.context.clock().now();
        let batches: Vec<Batch> = self
            .batches
            .list(caller)
            .await?
            .into_iter()
            .filter(|batch| range.contains(batch.started_at()))
            .collect();
        let mut durations = Vec::with_capacity(batches.len());
        let mut equipment_utilization = BTreeMap::new();
        for batch in &batches {
            let stages = self.batches.stages(&batch.id, caller).await?;
            let end = last_stage_end(&stages).unwrap_or(now);
            durations.push(end.millis_since(batch.started_at()));
            for stage in stages {
                *equipment_utilization.entry(stage.equipment_id).or_insert(0) += 1;
            }
        }
        Ok(ProductionMetrics {
            total_batches: batches.len(),
            completed_batches: batches
                .iter()
                .filter(|batch| batch.stage == BatchStage::Completed)
                .count(),
            average_batch_duration_ms: mean(&durations),
            total_volume: batches.iter().map(|batch| batch.volume).sum(),
            equipment_utilization,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the end time of the last stage, ordered by start.
fn last_stage_end(stages: &[StageEntry]) -> Option<Timestamp> {
    stages.last().and_then(|stage| stage.end_time)
}

/// Computes quality totals and the most common failing types.
fn summarize_checks(checks: &[QualityCheck]) -> QualityMetrics {
    let passed_checks = checks.iter().filter(|check| check.status == CheckStatus::Pass).count();
    let mut failures: BTreeMap<CheckType, usize> = BTreeMap::new();
    for check in checks.iter().filter(|check| check.status == CheckStatus::Fail) {
        *failures.entry(check.kind).or_insert(0) += 1;
    }
    let failed_checks = failures.values().sum();
    let mut common_issues: Vec<IssueCount> = failures
        .into_iter()
        .map(|(kind, count)| IssueCount {
            kind,
            count,
        })
        .collect();
    common_issues.sort_by(|a, b| b.count.cmp(&a.count).then(a.kind.cmp(&b.kind)));
    common_issues.truncate(TOP_ISSUES);
    QualityMetrics {
        total_checks: checks.len(),
        passed_checks,
        failed_checks,
        pass_rate: percent(passed_checks, checks.len()),
        common_issues,
    }
}

/// Returns `part` as a percentage of `whole`, or 0 when `whole` is 0.
#[allow(clippy::cast_precision_loss, reason = "Counts stay far below 2^52.")]
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Returns the arithmetic mean, or 0 for an empty slice.
#[allow(clippy::cast_precision_loss, reason = "Durations and counts stay far below 2^52.")]
fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|value| *value as f64).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test assertions use unwrap for clarity.")]

    use brewlog_core::OwnerId;

    use super::*;

    fn check(kind: CheckType, status: CheckStatus) -> QualityCheck {
        let owner = OwnerId::new("u1").unwrap();
        QualityCheck {
            id: RecordId::new("c").unwrap(),
            batch_id: "b".to_string(),
            timestamp: Timestamp::from_unix_millis(1),
            kind,
            value: None,
            unit: None,
            notes: None,
            status,
            updated_by: owner.clone(),
            created_by: owner,
            created_at: Timestamp::from_unix_millis(1),
            updated_at: Timestamp::from_unix_millis(1),
        }
    }

    #[test]
    fn ranges_include_both_ends() {
        let range =
            TimeRange::new(Timestamp::from_unix_millis(10), Timestamp::from_unix_millis(20));
        assert!(range.contains(Timestamp::from_unix_millis(10)));
        assert!(range.contains(Timestamp::from_unix_millis(20)));
        assert!(!range.contains(Timestamp::from_unix_millis(21)));
    }

    #[test]
    fn warnings_count_only_toward_the_total() {
        let checks = vec![
            check(CheckType::Ph, CheckStatus::Pass),
            check(CheckType::Ph, CheckStatus::Warning),
            check(CheckType::Taste, CheckStatus::Fail),
            check(CheckType::Ph, CheckStatus::Pass),
        ];
        let metrics = summarize_checks(&checks);
        assert_eq!(metrics.total_checks, 4);
        assert_eq!(metrics.passed_checks, 2);
        assert_eq!(metrics.failed_checks, 1);
        assert!((metrics.pass_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn common_issues_keep_the_five_most_frequent() {
        let mut checks = Vec::new();
        for (kind, failures) in [
            (CheckType::Ph, 1),
            (CheckType::Temperature, 4),
            (CheckType::Taste, 2),
            (CheckType::Visual, 4),
            (CheckType::Other, 3),
        ] {
            for _ in 0 .. failures {
                checks.push(check(kind, CheckStatus::Fail));
            }
        }
        let issues = summarize_checks(&checks).common_issues;
        let order: Vec<(CheckType, usize)> =
            issues.iter().map(|issue| (issue.kind, issue.count)).collect();
        assert_eq!(
            order,
            vec![
                (CheckType::Temperature, 4),
                (CheckType::Visual, 4),
                (CheckType::Other, 3),
                (CheckType::Taste, 2),
                (CheckType::Ph, 1),
            ]
        );
    }

    #[test]
    fn empty_inputs_yield_zero_rates() {
        let metrics = summarize_checks(&[]);
        assert_eq!(metrics.total_checks, 0);
        assert!(metrics.pass_rate.abs() < f64::EPSILON);
        assert!(mean(&[]).abs() < f64::EPSILON);
        assert!((mean(&[2, 4]) - 3.0).abs() < f64::EPSILON);
    }
}
