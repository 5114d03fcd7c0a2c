use serde::{Deserialize, Serialize};

use super::Finding;

/// Categories of security checks the registry knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Authentication,
    RateLimiting,
    SqlInjection,
    CrossSiteScripting,
    AccessControl,
    SecurityHeaders,
    BusinessLogic,
}

impl CheckKind {
    /// Every check category, in full-scan execution order
    pub const ALL: [CheckKind; 7] = [
        CheckKind::Authentication,
        CheckKind::RateLimiting,
        CheckKind::SqlInjection,
        CheckKind::CrossSiteScripting,
        CheckKind::AccessControl,
        CheckKind::SecurityHeaders,
        CheckKind::BusinessLogic,
    ];
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckKind::Authentication => "authentication",
            CheckKind::RateLimiting => "rate_limiting",
            CheckKind::SqlInjection => "sql_injection",
            CheckKind::CrossSiteScripting => "cross_site_scripting",
            CheckKind::AccessControl => "access_control",
            CheckKind::SecurityHeaders => "security_headers",
            CheckKind::BusinessLogic => "business_logic",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one individual test inside a check. A finding is present
/// exactly when the test failed.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    passed: bool,
    finding: Option<Finding>,
}

impl CheckResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            finding: None,
        }
    }

    pub fn fail(finding: Finding) -> Self {
        Self {
            passed: false,
            finding: Some(finding),
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn finding(&self) -> Option<&Finding> {
        self.finding.as_ref()
    }

    pub fn into_finding(self) -> Option<Finding> {
        self.finding
    }
}

/// Everything a single check invocation hands back to the orchestrator
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
    /// Problems that did not stop the check from producing results
    pub errors: Vec<String>,
    pub requests_made: u32,
    pub endpoints_scanned: u32,
}

impl CheckReport {
    pub fn new(results: Vec<CheckResult>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }

    pub fn with_requests(mut self, requests_made: u32, endpoints_scanned: u32) -> Self {
        self.requests_made = requests_made;
        self.endpoints_scanned = endpoints_scanned;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }

    /// Findings of failing results, in result order
    pub fn into_findings(self) -> Vec<Finding> {
        self.results
            .into_iter()
            .filter(|r| !r.passed())
            .filter_map(CheckResult::into_finding)
            .collect()
    }
}

impl From<Vec<CheckResult>> for CheckReport {
    fn from(results: Vec<CheckResult>) -> Self {
        Self::new(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    #[test]
    fn test_only_failed_results_produce_findings() {
        let report = CheckReport::new(vec![
            CheckResult::pass(),
            CheckResult::fail(Finding::new("first", "d", Severity::High, "c")),
            CheckResult::pass(),
            CheckResult::fail(Finding::new("second", "d", Severity::Low, "c")),
        ]);

        assert_eq!(report.failed_count(), 2);
        let titles: Vec<_> = report.into_findings().into_iter().map(|f| f.title).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn test_check_result_invariant() {
        assert!(CheckResult::pass().finding().is_none());
        let failed = CheckResult::fail(Finding::new("t", "d", Severity::Info, "c"));
        assert!(!failed.passed());
        assert!(failed.finding().is_some());
    }
}
