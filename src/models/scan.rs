use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use super::{CheckKind, Finding};
use crate::error::ScanError;

// ============================================================================
// Scan type and status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanType {
    Full,
    Quick,
    Api,
    Authentication,
    Injection,
    Custom,
}

impl ScanType {
    pub const ALL: [ScanType; 6] = [
        ScanType::Full,
        ScanType::Quick,
        ScanType::Api,
        ScanType::Authentication,
        ScanType::Injection,
        ScanType::Custom,
    ];

    /// Ordered check categories run for this scan type.
    /// Custom scans have no caller-supplied selection yet and run the full set.
    pub fn check_plan(&self) -> &'static [CheckKind] {
        match self {
            ScanType::Full | ScanType::Custom => &CheckKind::ALL,
            ScanType::Quick => &[CheckKind::SecurityHeaders],
            ScanType::Api => &[CheckKind::RateLimiting, CheckKind::AccessControl],
            ScanType::Authentication => &[CheckKind::Authentication],
            ScanType::Injection => &[CheckKind::SqlInjection, CheckKind::CrossSiteScripting],
        }
    }

    /// Progress reported once the job is running, before the first check finishes
    pub fn initial_progress(&self) -> u8 {
        match self {
            ScanType::Full | ScanType::Custom => 10,
            _ => 20,
        }
    }

    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for ScanType {
    fn default() -> Self {
        Self::Full
    }
}

impl std::fmt::Display for ScanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanType::Full => write!(f, "FULL"),
            ScanType::Quick => write!(f, "QUICK"),
            ScanType::Api => write!(f, "API"),
            ScanType::Authentication => write!(f, "AUTHENTICATION"),
            ScanType::Injection => write!(f, "INJECTION"),
            ScanType::Custom => write!(f, "CUSTOM"),
        }
    }
}

impl FromStr for ScanType {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FULL" => Ok(ScanType::Full),
            "QUICK" => Ok(ScanType::Quick),
            "API" => Ok(ScanType::Api),
            "AUTHENTICATION" => Ok(ScanType::Authentication),
            "INJECTION" => Ok(ScanType::Injection),
            "CUSTOM" => Ok(ScanType::Custom),
            _ => Err(ScanError::InvalidScanType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanStatus::Completed | ScanStatus::Failed | ScanStatus::Cancelled
        )
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        matches!(
            (self, next),
            (ScanStatus::Pending, ScanStatus::Running)
                | (ScanStatus::Pending, ScanStatus::Cancelled)
                | (ScanStatus::Running, ScanStatus::Completed)
                | (ScanStatus::Running, ScanStatus::Failed)
                | (ScanStatus::Running, ScanStatus::Cancelled)
        )
    }
}

impl Default for ScanStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStatus::Pending => write!(f, "PENDING"),
            ScanStatus::Running => write!(f, "RUNNING"),
            ScanStatus::Completed => write!(f, "COMPLETED"),
            ScanStatus::Failed => write!(f, "FAILED"),
            ScanStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ============================================================================
// Scan target and options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Web,
    Api,
    Internal,
}

impl Default for TargetType {
    fn default() -> Self {
        Self::Web
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthType {
    Bearer,
    Basic,
    Cookie,
    ApiKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanAuth {
    #[serde(rename = "type")]
    pub auth_type: AuthType,
    #[serde(default)]
    pub credentials: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTarget {
    pub url: String,
    #[serde(rename = "type", default)]
    pub target_type: TargetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<ScanAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

impl ScanTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target_type: TargetType::default(),
            auth: None,
            headers: None,
        }
    }

    /// URL without a trailing slash, suitable for appending endpoint paths
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

pub const DEFAULT_SCAN_DEPTH: u32 = 3;
pub const DEFAULT_SCAN_THREADS: u32 = 10;
pub const DEFAULT_SCAN_TIMEOUT_SECONDS: u32 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
    /// Seconds. Advisory for checks; the orchestrator does not enforce it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub include_patterns: Vec<String>,
    #[serde(default)]
    pub custom_payloads: Vec<String>,
}

impl ScanOptions {
    /// Fill in every unset knob with its default
    pub fn resolve(options: Option<&ScanOptions>) -> ScanOptions {
        let mut resolved = options.cloned().unwrap_or_default();
        resolved.depth.get_or_insert(DEFAULT_SCAN_DEPTH);
        resolved.threads.get_or_insert(DEFAULT_SCAN_THREADS);
        resolved.timeout.get_or_insert(DEFAULT_SCAN_TIMEOUT_SECONDS);
        resolved
    }
}

// ============================================================================
// Scan result
// ============================================================================

pub const SCANNER_NAME: &str = "novacore-security";
pub const SCANNER_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub requests_made: u32,
    pub endpoints_scanned: u32,
    pub vulnerabilities_found: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub scanner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Whole seconds, rounded
    pub duration: u64,
    pub findings: Vec<Finding>,
    pub errors: Vec<String>,
    pub stats: ScanStats,
}

// ============================================================================
// Scan job
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanJob {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub target: ScanTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ScanOptions>,
    pub status: ScanStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<ScanResult>,
    pub error: Option<String>,
}

impl ScanJob {
    pub fn new(
        id: String,
        name: String,
        scan_type: ScanType,
        target: ScanTarget,
        options: Option<ScanOptions>,
    ) -> Self {
        Self {
            id,
            name,
            scan_type,
            target,
            options,
            status: ScanStatus::Pending,
            progress: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }

    fn transition(&mut self, next: ScanStatus) -> Result<(), ScanError> {
        if self.status.can_transition_to(next) {
            self.status = next;
            Ok(())
        } else {
            Err(ScanError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: next,
            })
        }
    }

    pub fn start(&mut self) -> Result<(), ScanError> {
        self.transition(ScanStatus::Running)?;
        self.started_at = Some(Utc::now());
        self.progress = 0;
        Ok(())
    }

    /// Raise progress while running. Never decreases, and stays below 100
    /// until the job completes.
    pub fn advance_progress(&mut self, progress: u8) -> Result<(), ScanError> {
        if self.status != ScanStatus::Running {
            return Err(ScanError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: ScanStatus::Running,
            });
        }
        self.progress = self.progress.max(progress.min(99));
        Ok(())
    }

    pub fn complete(&mut self, result: ScanResult) -> Result<(), ScanError> {
        self.transition(ScanStatus::Completed)?;
        self.completed_at = Some(result.completed_at);
        self.progress = 100;
        self.result = Some(result);
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<(), ScanError> {
        self.transition(ScanStatus::Failed)?;
        self.completed_at = Some(Utc::now());
        self.error = Some(error);
        Ok(())
    }

    /// Cancel a pending or running job. Returns false, leaving the job
    /// untouched, when it has already reached a terminal state.
    pub fn cancel(&mut self) -> bool {
        if self.transition(ScanStatus::Cancelled).is_err() {
            return false;
        }
        self.completed_at = Some(Utc::now());
        true
    }

    pub fn findings_count(&self) -> u32 {
        self.result
            .as_ref()
            .map(|r| r.stats.vulnerabilities_found)
            .unwrap_or(0)
    }
}

/// Input for creating a scan job. The scan type is kept as text so that it
/// can be validated by the orchestrator.
#[derive(Debug, Clone)]
pub struct ScanJobCreate {
    pub name: String,
    pub scan_type: Option<String>,
    pub target: ScanTarget,
    pub options: Option<ScanOptions>,
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Returned right after a scan is submitted
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanJobCreatedResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub status: ScanStatus,
    pub target_url: String,
}

impl From<&ScanJob> for ScanJobCreatedResponse {
    fn from(job: &ScanJob) -> Self {
        Self {
            id: job.id.clone(),
            name: job.name.clone(),
            scan_type: job.scan_type,
            status: job.status,
            target_url: job.target.url.clone(),
        }
    }
}

/// One row of the scan list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanJobSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub status: ScanStatus,
    pub progress: u8,
    pub target_url: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub findings: u32,
    pub error: Option<String>,
}

impl From<&ScanJob> for ScanJobSummary {
    fn from(job: &ScanJob) -> Self {
        Self {
            id: job.id.clone(),
            name: job.name.clone(),
            scan_type: job.scan_type,
            status: job.status,
            progress: job.progress,
            target_url: job.target.url.clone(),
            started_at: job.started_at,
            completed_at: job.completed_at,
            findings: job.findings_count(),
            error: job.error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTargetView {
    pub url: String,
    #[serde(rename = "type")]
    pub target_type: TargetType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResultView {
    pub findings: Vec<Finding>,
    pub stats: ScanStats,
    pub errors: Vec<String>,
}

/// Full job detail, including the result once the job completed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanJobDetailResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub status: ScanStatus,
    pub progress: u8,
    pub target: ScanTargetView,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration: Option<u64>,
    pub result: Option<ScanResultView>,
    pub error: Option<String>,
}

impl From<ScanJob> for ScanJobDetailResponse {
    fn from(job: ScanJob) -> Self {
        Self {
            id: job.id,
            name: job.name,
            scan_type: job.scan_type,
            status: job.status,
            progress: job.progress,
            target: ScanTargetView {
                url: job.target.url,
                target_type: job.target.target_type,
            },
            started_at: job.started_at,
            completed_at: job.completed_at,
            duration: job.result.as_ref().map(|r| r.duration),
            result: job.result.map(|r| ScanResultView {
                findings: r.findings,
                stats: r.stats,
                errors: r.errors,
            }),
            error: job.error,
        }
    }
}

/// Job counts by status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatistics {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl JobStatistics {
    pub fn record(&mut self, status: ScanStatus) {
        self.total += 1;
        match status {
            ScanStatus::Pending => self.pending += 1,
            ScanStatus::Running => self.running += 1,
            ScanStatus::Completed => self.completed += 1,
            ScanStatus::Failed => self.failed += 1,
            ScanStatus::Cancelled => self.cancelled += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> ScanJob {
        ScanJob::new(
            "scan_1_abc".to_string(),
            "Nightly".to_string(),
            ScanType::Quick,
            ScanTarget::new("https://example.test"),
            None,
        )
    }

    fn sample_result() -> ScanResult {
        let now = Utc::now();
        ScanResult {
            scanner: SCANNER_NAME.to_string(),
            version: Some(SCANNER_VERSION.to_string()),
            started_at: now,
            completed_at: now,
            duration: 0,
            findings: Vec::new(),
            errors: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    #[test]
    fn test_scan_type_parsing() {
        assert_eq!("FULL".parse::<ScanType>().unwrap(), ScanType::Full);
        assert_eq!("CUSTOM".parse::<ScanType>().unwrap(), ScanType::Custom);
        for raw in ["quick", " INJECTION ", "Injection", "   "] {
            assert_eq!(
                raw.parse::<ScanType>().unwrap_err(),
                ScanError::InvalidScanType(raw.to_string())
            );
        }
        assert!(matches!(
            "BOGUS".parse::<ScanType>(),
            Err(ScanError::InvalidScanType(t)) if t == "BOGUS"
        ));
    }

    #[test]
    fn test_scan_type_serde_names() {
        assert_eq!(serde_json::to_value(ScanType::Authentication).unwrap(), "AUTHENTICATION");
        assert_eq!(serde_json::to_value(ScanStatus::Cancelled).unwrap(), "CANCELLED");
        assert_eq!(ScanType::valid_values(), "FULL, QUICK, API, AUTHENTICATION, INJECTION, CUSTOM");
    }

    #[test]
    fn test_check_plans() {
        assert_eq!(ScanType::Full.check_plan().len(), 7);
        assert_eq!(ScanType::Custom.check_plan(), ScanType::Full.check_plan());
        assert_eq!(ScanType::Quick.check_plan(), &[CheckKind::SecurityHeaders]);
        assert_eq!(
            ScanType::Injection.check_plan(),
            &[CheckKind::SqlInjection, CheckKind::CrossSiteScripting]
        );
    }

    #[test]
    fn test_status_machine() {
        assert!(ScanStatus::Pending.can_transition_to(ScanStatus::Running));
        assert!(ScanStatus::Pending.can_transition_to(ScanStatus::Cancelled));
        assert!(!ScanStatus::Pending.can_transition_to(ScanStatus::Completed));
        assert!(!ScanStatus::Completed.can_transition_to(ScanStatus::Running));
        assert!(!ScanStatus::Cancelled.can_transition_to(ScanStatus::Running));
        for terminal in [ScanStatus::Completed, ScanStatus::Failed, ScanStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for next in [ScanStatus::Pending, ScanStatus::Running, ScanStatus::Completed, ScanStatus::Failed, ScanStatus::Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_job_lifecycle_sets_result_and_progress() {
        let mut job = sample_job();
        job.start().unwrap();
        assert_eq!(job.status, ScanStatus::Running);
        assert!(job.started_at.is_some());

        job.advance_progress(40).unwrap();
        job.advance_progress(20).unwrap();
        assert_eq!(job.progress, 40);
        job.advance_progress(100).unwrap();
        assert_eq!(job.progress, 99);

        job.complete(sample_result()).unwrap();
        assert_eq!(job.status, ScanStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.result.is_some());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_failed_job_keeps_error_only() {
        let mut job = sample_job();
        job.start().unwrap();
        job.fail("target unreachable".to_string()).unwrap();
        assert_eq!(job.status, ScanStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("target unreachable"));
        assert!(job.result.is_none());
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_cancelled_job_rejects_completion() {
        let mut job = sample_job();
        job.start().unwrap();
        assert!(job.cancel());
        assert!(!job.cancel());

        let err = job.complete(sample_result()).unwrap_err();
        assert!(matches!(
            err,
            ScanError::InvalidTransition { from: ScanStatus::Cancelled, to: ScanStatus::Completed, .. }
        ));
        assert!(job.result.is_none());
        assert!(job.advance_progress(50).is_err());
    }

    #[test]
    fn test_options_resolution() {
        let resolved = ScanOptions::resolve(None);
        assert_eq!(resolved.depth, Some(DEFAULT_SCAN_DEPTH));
        assert_eq!(resolved.threads, Some(DEFAULT_SCAN_THREADS));
        assert_eq!(resolved.timeout, Some(DEFAULT_SCAN_TIMEOUT_SECONDS));

        let custom = ScanOptions {
            depth: Some(1),
            ..Default::default()
        };
        let resolved = ScanOptions::resolve(Some(&custom));
        assert_eq!(resolved.depth, Some(1));
        assert_eq!(resolved.timeout, Some(DEFAULT_SCAN_TIMEOUT_SECONDS));
    }

    #[test]
    fn test_target_deserialization() {
        let target: ScanTarget = serde_json::from_value(serde_json::json!({
            "url": "https://api.example.test/",
            "type": "api",
            "auth": { "type": "api-key", "credentials": { "key": "secret" } }
        }))
        .unwrap();

        assert_eq!(target.target_type, TargetType::Api);
        assert_eq!(target.auth.as_ref().unwrap().auth_type, AuthType::ApiKey);
        assert_eq!(target.base_url(), "https://api.example.test");
    }

    #[test]
    fn test_detail_response_shape() {
        let mut job = sample_job();
        let pending = serde_json::to_value(ScanJobDetailResponse::from(job.clone())).unwrap();
        assert!(pending["result"].is_null());
        assert_eq!(pending["target"]["type"], "web");

        job.start().unwrap();
        job.complete(sample_result()).unwrap();
        let done = serde_json::to_value(ScanJobDetailResponse::from(job)).unwrap();
        assert_eq!(done["status"], "COMPLETED");
        assert_eq!(done["duration"], 0);
        assert!(done["result"]["findings"].is_array());
        assert_eq!(done["result"]["stats"]["vulnerabilitiesFound"], 0);
    }
}
