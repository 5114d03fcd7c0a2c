//! Deterministic security checks. They describe the issues a probing backend
//! would report for the dashboard's financial API without touching the
//! network, so every scan of the same target yields the same findings.

use async_trait::async_trait;

use crate::models::{CheckReport, CheckResult, Finding, ScanOptions, ScanTarget, Severity};

#[async_trait]
pub trait SecurityCheck: Send + Sync {
    fn name(&self) -> &str;

    /// A vulnerability is reported as a failing result. `Err` means the check
    /// itself could not run.
    async fn run(&self, target: &ScanTarget, options: &ScanOptions) -> anyhow::Result<CheckReport>;
}

fn cwe_reference(id: u32) -> String {
    format!("https://cwe.mitre.org/data/definitions/{}.html", id)
}

pub struct AuthenticationCheck;

#[async_trait]
impl SecurityCheck for AuthenticationCheck {
    fn name(&self) -> &str {
        "authentication"
    }

    async fn run(&self, target: &ScanTarget, _options: &ScanOptions) -> anyhow::Result<CheckReport> {
        let base = target.base_url();

        let algorithm = Finding::new(
            "JWT algorithm not validated",
            "The authentication endpoint does not validate the JWT algorithm, allowing algorithm confusion attacks (alg:none).",
            Severity::Critical,
            "Authentication",
        )
        .with_affected_url(format!("{}/api/auth", base))
        .with_remediation("Validate the JWT algorithm explicitly. Reject tokens using alg:none or any unexpected algorithm.")
        .with_cwe("CWE-347")
        .with_cvss(9.1)
        .with_reference(cwe_reference(347));

        let lifetime = Finding::new(
            "JWT lifetime too long",
            "Access tokens expire after 24 hours, well beyond the 15 minute limit recommended for financial applications.",
            Severity::High,
            "Session Management",
        )
        .with_remediation("Limit access tokens to 15 minutes and renew them with refresh tokens.")
        .with_cwe("CWE-613")
        .with_reference(cwe_reference(613));

        Ok(CheckReport::new(vec![CheckResult::fail(algorithm), CheckResult::fail(lifetime)])
            .with_requests(2, 1))
    }
}

/// Requests fired at a single endpoint to look for throttling
const RATE_LIMIT_BURST: u32 = 20;

pub struct RateLimitingCheck;

#[async_trait]
impl SecurityCheck for RateLimitingCheck {
    fn name(&self) -> &str {
        "rate_limiting"
    }

    async fn run(&self, target: &ScanTarget, _options: &ScanOptions) -> anyhow::Result<CheckReport> {
        let finding = Finding::new(
            "Missing rate limiting on critical endpoint",
            "The dispersions endpoint does not enforce rate limiting, leaving it open to brute force and denial of service.",
            Severity::High,
            "API Security",
        )
        .with_affected_url(format!("{}/api/dispersions", target.base_url()))
        .with_remediation("Limit financial endpoints to 10 requests per minute per user and 100 per minute per IP.")
        .with_cwe("CWE-770")
        .with_cvss(7.5)
        .with_reference(cwe_reference(770));

        Ok(CheckReport::new(vec![CheckResult::fail(finding)]).with_requests(RATE_LIMIT_BURST, 1))
    }
}

pub const SQL_INJECTION_PAYLOADS: [&str; 4] = [
    "' OR '1'='1",
    "1; DROP TABLE users--",
    "' UNION SELECT NULL--",
    "1' AND SLEEP(5)--",
];

pub struct SqlInjectionCheck;

#[async_trait]
impl SecurityCheck for SqlInjectionCheck {
    fn name(&self) -> &str {
        "sql_injection"
    }

    async fn run(&self, target: &ScanTarget, options: &ScanOptions) -> anyhow::Result<CheckReport> {
        let attempts = SQL_INJECTION_PAYLOADS.len() + options.custom_payloads.len();

        let finding = Finding::new(
            "SQL injection in account_id parameter",
            "The 'account_id' parameter is injectable. Test payloads produced anomalous responses that indicate SQL execution.",
            Severity::Critical,
            "Injection",
        )
        .with_affected_url(format!("{}/api/transactions?account_id=", target.base_url()))
        .with_evidence(format!(
            "Payload: {} - Response time: 5.2s (baseline: 0.1s)",
            SQL_INJECTION_PAYLOADS[0]
        ))
        .with_remediation("Use parameterized queries, validate input and rely on an ORM with automatic escaping.")
        .with_cwe("CWE-89")
        .with_cvss(9.8)
        .with_reference(cwe_reference(89));

        Ok(CheckReport::new(vec![CheckResult::fail(finding)]).with_requests(attempts as u32, 1))
    }
}

pub struct CrossSiteScriptingCheck;

#[async_trait]
impl SecurityCheck for CrossSiteScriptingCheck {
    fn name(&self) -> &str {
        "cross_site_scripting"
    }

    async fn run(&self, target: &ScanTarget, _options: &ScanOptions) -> anyhow::Result<CheckReport> {
        let finding = Finding::new(
            "Stored cross-site scripting in transaction notes",
            "The transaction notes field does not sanitize HTML input, allowing stored XSS.",
            Severity::Medium,
            "XSS",
        )
        .with_affected_url(format!("{}/dashboard/transactions", target.base_url()))
        .with_evidence("<script>alert('XSS')</script> executed when the transaction is displayed")
        .with_remediation("Sanitize all user input, escape HTML when rendering and deploy a Content Security Policy.")
        .with_cwe("CWE-79")
        .with_cvss(6.1)
        .with_reference(cwe_reference(79));

        Ok(CheckReport::new(vec![CheckResult::fail(finding)]).with_requests(1, 1))
    }
}

pub struct AccessControlCheck;

#[async_trait]
impl SecurityCheck for AccessControlCheck {
    fn name(&self) -> &str {
        "access_control"
    }

    async fn run(&self, target: &ScanTarget, _options: &ScanOptions) -> anyhow::Result<CheckReport> {
        let finding = Finding::new(
            "API access control bypass",
            "Some API endpoints do not validate roles on the server, allowing unauthorized access.",
            Severity::High,
            "Access Control",
        )
        .with_affected_url(format!("{}/api/admin/users", target.base_url()))
        .with_remediation("Enforce role checks in every backend endpoint, not only in the frontend.")
        .with_cwe("CWE-639")
        .with_cvss(8.1)
        .with_reference(cwe_reference(639));

        Ok(CheckReport::new(vec![CheckResult::fail(finding)]).with_requests(1, 1))
    }
}

pub const REQUIRED_SECURITY_HEADERS: [&str; 5] = [
    "Strict-Transport-Security",
    "X-Content-Type-Options",
    "X-Frame-Options",
    "Content-Security-Policy",
    "X-XSS-Protection",
];

pub struct SecurityHeadersCheck;

#[async_trait]
impl SecurityCheck for SecurityHeadersCheck {
    fn name(&self) -> &str {
        "security_headers"
    }

    async fn run(&self, _target: &ScanTarget, _options: &ScanOptions) -> anyhow::Result<CheckReport> {
        let finding = Finding::new(
            "Missing security headers",
            format!(
                "Inspected {} response headers. X-Frame-Options, Content-Security-Policy and Strict-Transport-Security are missing.",
                REQUIRED_SECURITY_HEADERS.len()
            ),
            Severity::Low,
            "Configuration",
        )
        .with_remediation("Set the security headers in the web server or application middleware.")
        .with_cwe("CWE-693")
        .with_cvss(3.7)
        .with_reference(cwe_reference(693));

        Ok(CheckReport::new(vec![CheckResult::fail(finding)]).with_requests(1, 1))
    }
}

/// Payment flow rules: IP allow-listing, request signing and maker/checker
pub struct BusinessLogicCheck;

#[async_trait]
impl SecurityCheck for BusinessLogicCheck {
    fn name(&self) -> &str {
        "business_logic"
    }

    async fn run(&self, target: &ScanTarget, _options: &ScanOptions) -> anyhow::Result<CheckReport> {
        let maker_checker = Finding::new(
            "Maker/checker bypass on scheduled dispersions",
            "The user who creates a scheduled dispersion can also approve it, violating segregation of duties.",
            Severity::Critical,
            "Business Logic",
        )
        .with_affected_url(format!("{}/api/dispersions/scheduled", target.base_url()))
        .with_remediation("Prevent creators from approving their own dispersions, scheduled ones included.")
        .with_cwe("CWE-284")
        .with_cvss(8.5)
        .with_reference(cwe_reference(284));

        let results = vec![
            CheckResult::pass(),
            CheckResult::pass(),
            CheckResult::fail(maker_checker),
        ];
        Ok(CheckReport::new(results).with_requests(3, 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ScanTarget {
        ScanTarget::new("https://bank.example.test/")
    }

    #[tokio::test]
    async fn test_authentication_findings() {
        let report = AuthenticationCheck
            .run(&target(), &ScanOptions::resolve(None))
            .await
            .unwrap();

        assert_eq!(report.failed_count(), 2);
        let findings = report.into_findings();
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].cwe_id.as_deref(), Some("CWE-347"));
        assert_eq!(findings[0].cvss_score, Some(9.1));
        assert_eq!(
            findings[0].affected_url.as_deref(),
            Some("https://bank.example.test/api/auth")
        );
        assert_eq!(findings[1].severity, Severity::High);
        assert_eq!(findings[1].cwe_id.as_deref(), Some("CWE-613"));
    }

    #[tokio::test]
    async fn test_sql_injection_counts_custom_payloads() {
        let options = ScanOptions {
            custom_payloads: vec!["admin'--".to_string()],
            ..ScanOptions::resolve(None)
        };
        let report = SqlInjectionCheck.run(&target(), &options).await.unwrap();
        assert_eq!(report.requests_made, 5);

        let finding = report.into_findings().remove(0);
        assert_eq!(finding.cwe_id.as_deref(), Some("CWE-89"));
        assert_eq!(finding.cvss_score, Some(9.8));
        assert!(finding.evidence.is_some());
    }

    #[tokio::test]
    async fn test_business_logic_mixes_passes_and_failures() {
        let report = BusinessLogicCheck
            .run(&target(), &ScanOptions::resolve(None))
            .await
            .unwrap();

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.into_findings()[0].cwe_id.as_deref(), Some("CWE-284"));
    }

    #[tokio::test]
    async fn test_single_finding_checks() {
        let options = ScanOptions::resolve(None);
        let cases: Vec<(Box<dyn SecurityCheck>, Severity, &str)> = vec![
            (Box::new(RateLimitingCheck), Severity::High, "CWE-770"),
            (Box::new(CrossSiteScriptingCheck), Severity::Medium, "CWE-79"),
            (Box::new(AccessControlCheck), Severity::High, "CWE-639"),
            (Box::new(SecurityHeadersCheck), Severity::Low, "CWE-693"),
        ];

        for (check, severity, cwe) in cases {
            let findings = check.run(&target(), &options).await.unwrap().into_findings();
            assert_eq!(findings.len(), 1, "{}", check.name());
            assert_eq!(findings[0].severity, severity);
            assert_eq!(findings[0].cwe_id.as_deref(), Some(cwe));
        }
    }
}
