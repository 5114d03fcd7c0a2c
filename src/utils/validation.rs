use crate::error::ScanError;

const MAX_NAME_LENGTH: usize = 200;

pub fn validate_name(name: &str) -> Result<(), ScanError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ScanError::Validation("Scan name cannot be empty".to_string()));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ScanError::Validation(format!(
            "Scan name cannot exceed {} characters",
            MAX_NAME_LENGTH
        )));
    }

    Ok(())
}

pub fn validate_target_url(url: &str) -> Result<(), ScanError> {
    if url.trim().is_empty() {
        return Err(ScanError::InvalidTarget("Target URL cannot be empty".to_string()));
    }

    if url.chars().any(char::is_whitespace) {
        return Err(ScanError::InvalidTarget(
            "Target URL cannot contain whitespace".to_string(),
        ));
    }

    Ok(())
}

/// Standard five-field cron, or six fields with leading seconds
pub fn validate_cron_expression(expression: &str) -> Result<(), ScanError> {
    let fields = expression.split_whitespace().count();
    if fields == 5 || fields == 6 {
        Ok(())
    } else {
        Err(ScanError::InvalidSchedule(format!(
            "Cron expression must have 5 or 6 fields, got {}",
            fields
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Nightly API scan").is_ok());
        assert!(matches!(validate_name("   "), Err(ScanError::Validation(_))));
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_target_url() {
        assert!(validate_target_url("https://bank.example.test").is_ok());
        assert!(matches!(validate_target_url(""), Err(ScanError::InvalidTarget(_))));
        assert!(matches!(
            validate_target_url("https://bank example"),
            Err(ScanError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_validate_cron_expression() {
        assert!(validate_cron_expression("0 2 * * *").is_ok());
        assert!(validate_cron_expression("0 0 2 * * MON").is_ok());
        assert!(matches!(
            validate_cron_expression("every night"),
            Err(ScanError::InvalidSchedule(_))
        ));
        assert!(validate_cron_expression("").is_err());
    }
}
