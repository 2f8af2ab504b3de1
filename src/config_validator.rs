//! Configuration Validation
//!
//! Validates broker configuration at startup.
//! Collects every invalid value so the operator sees all problems at once.

use std::net::Ipv6Addr;

/// Configuration validation errors
#[derive(Debug)]
pub struct ConfigValidationError {
    pub field: String,
    pub value: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid configuration for '{}': {} (value: {})",
            self.field, self.message, self.value
        )
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of config validation
pub type ConfigResult<T> = Result<T, Vec<ConfigValidationError>>;

/// Configuration validator
pub struct ConfigValidator {
    errors: Vec<ConfigValidationError>,
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error
    fn error(&mut self, field: &str, value: impl std::fmt::Display, message: &str) {
        self.errors.push(ConfigValidationError {
            field: field.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        });
    }

    /// Validate port number (1-65535)
    pub fn validate_port(&mut self, field: &str, port: u16) -> &mut Self {
        if port == 0 {
            self.error(field, port, "Port must be between 1 and 65535");
        }
        self
    }

    /// Validate range (inclusive)
    pub fn validate_range(&mut self, field: &str, value: i64, min: i64, max: i64) -> &mut Self {
        if value < min || value > max {
            self.error(field, value, &format!("Value must be between {} and {}", min, max));
        }
        self
    }

    /// Validate non-empty string
    pub fn validate_non_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.error(field, value, "Value cannot be empty");
        }
        self
    }

    /// Validate a host name or address that is embedded in connection URIs
    pub fn validate_host(&mut self, field: &str, value: &str) -> &mut Self {
        if value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '@' | '?' | '#'))
        {
            self.error(field, value, "Host must not contain whitespace, '/', '@', '?' or '#'");
        } else if value.contains(':') && value.parse::<Ipv6Addr>().is_err() {
            self.error(
                field,
                value,
                "Host must not contain ':' unless it is an IPv6 address; set the port separately",
            );
        }
        self
    }

    /// Validate the host part of an account name, which is embedded in a
    /// quoted SQL literal
    pub fn validate_account_host(&mut self, field: &str, value: &str) -> &mut Self {
        if value.chars().any(|c| matches!(c, '\\' | '\'') || c.is_control()) {
            self.error(
                field,
                value,
                "Account host must not contain quotes, backslashes or control characters",
            );
        }
        self
    }

    /// Finish validation and return result
    pub fn finish(self) -> ConfigResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    /// Check if any errors occurred
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get current errors
    pub fn errors(&self) -> &[ConfigValidationError] {
        &self.errors
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_port() {
        let mut v = ConfigValidator::new();
        v.validate_port("port", 3306);
        assert!(!v.has_errors());
    }

    #[test]
    fn test_invalid_port() {
        let mut v = ConfigValidator::new();
        v.validate_port("port", 0);
        assert!(v.has_errors());
    }

    #[test]
    fn test_range() {
        let mut v = ConfigValidator::new();
        v.validate_range("timeout", 0, 1, 300);
        v.validate_range("timeout", 30, 1, 300);
        assert_eq!(v.errors().len(), 1);
    }

    #[test]
    fn test_host() {
        let mut v = ConfigValidator::new();
        v.validate_host("host", "mariadb.internal");
        v.validate_host("host", "10.0.0.7");
        assert!(!v.has_errors());

        v.validate_host("host", "user@evil/host");
        assert!(v.has_errors());
    }

    #[test]
    fn test_host_with_port() {
        let mut v = ConfigValidator::new();
        v.validate_host("host", "::1");
        v.validate_host("host", "fd00::7");
        assert!(!v.has_errors());

        v.validate_host("host", "db:3307");
        v.validate_host("host", "[::1]");
        assert_eq!(v.errors().len(), 2);
    }

    #[test]
    fn test_account_host() {
        let mut v = ConfigValidator::new();
        v.validate_account_host("user_host", "%");
        v.validate_account_host("user_host", "10.0.%");
        assert!(!v.has_errors());

        v.validate_account_host("user_host", r"10\.0");
        v.validate_account_host("user_host", "x' OR '1");
        assert_eq!(v.errors().len(), 2);
    }

    #[test]
    fn test_multiple_errors() {
        let mut v = ConfigValidator::new();
        v.validate_port("port", 0)
            .validate_non_empty("name", "")
            .validate_range("count", -1, 0, 10);

        let result = v.finish();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().len(), 3);
    }
}
