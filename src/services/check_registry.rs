use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    error::ScanError,
    models::{CheckKind, ScanType},
    services::checks::{
        AccessControlCheck, AuthenticationCheck, BusinessLogicCheck, CrossSiteScriptingCheck,
        RateLimitingCheck, SecurityCheck, SecurityHeadersCheck, SqlInjectionCheck,
    },
};

/// Maps check categories to their implementations
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: HashMap<CheckKind, Arc<dyn SecurityCheck>>,
}

impl CheckRegistry {
    /// A registry without any checks
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_checks() -> Self {
        let mut registry = Self::new();
        for kind in CheckKind::ALL {
            let check: Arc<dyn SecurityCheck> = match kind {
                CheckKind::Authentication => Arc::new(AuthenticationCheck),
                CheckKind::RateLimiting => Arc::new(RateLimitingCheck),
                CheckKind::SqlInjection => Arc::new(SqlInjectionCheck),
                CheckKind::CrossSiteScripting => Arc::new(CrossSiteScriptingCheck),
                CheckKind::AccessControl => Arc::new(AccessControlCheck),
                CheckKind::SecurityHeaders => Arc::new(SecurityHeadersCheck),
                CheckKind::BusinessLogic => Arc::new(BusinessLogicCheck),
            };
            registry.register(kind, check);
        }
        registry
    }

    /// Register a check, replacing any previous one for the same kind
    pub fn register(&mut self, kind: CheckKind, check: Arc<dyn SecurityCheck>) {
        self.checks.insert(kind, check);
    }

    /// Ordered checks to run for a scan type
    pub fn resolve(
        &self,
        scan_type: ScanType,
    ) -> Result<Vec<(CheckKind, Arc<dyn SecurityCheck>)>, ScanError> {
        scan_type
            .check_plan()
            .iter()
            .map(|kind| {
                self.checks
                    .get(kind)
                    .map(|check| (*kind, Arc::clone(check)))
                    .ok_or(ScanError::CheckNotRegistered(*kind))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_full_scan_order() {
        let registry = CheckRegistry::with_default_checks();
        let kinds: Vec<CheckKind> = registry
            .resolve(ScanType::Full)
            .unwrap()
            .into_iter()
            .map(|(kind, _)| kind)
            .collect();
        assert_eq!(kinds, CheckKind::ALL.to_vec());
    }

    #[test]
    fn test_resolved_checks_match_their_kind() {
        let registry = CheckRegistry::with_default_checks();
        for scan_type in ScanType::ALL {
            for (kind, check) in registry.resolve(scan_type).unwrap() {
                assert_eq!(check.name(), kind.to_string());
            }
        }
    }

    #[test]
    fn test_missing_check_is_reported() {
        let mut registry = CheckRegistry::new();
        registry.register(CheckKind::SqlInjection, Arc::new(SqlInjectionCheck));

        assert!(registry.resolve(ScanType::Quick).is_err());
        assert!(matches!(
            registry.resolve(ScanType::Injection),
            Err(ScanError::CheckNotRegistered(CheckKind::CrossSiteScripting))
        ));
    }
}
