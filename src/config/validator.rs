use crate::config::Config;
use crate::error::{Result, UnspoolError, ValidationError};

/// Platform-imposed maximum tweets per timeline request
pub const MAX_PAGE_SIZE: usize = 100;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_api(config, &mut errors);
        Self::validate_output(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(UnspoolError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_api(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.api.base_url.is_empty() {
            errors.push(ValidationError::new(
                "api.base_url",
                "Base URL must not be empty",
            ));
        }

        if config.api.bearer_token_env.is_empty() {
            errors.push(ValidationError::new(
                "api.bearer_token_env",
                "Bearer token variable name must not be empty",
            ));
        }

        if config.api.page_size == 0 || config.api.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError::new(
                "api.page_size",
                format!("Page size must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }
    }

    fn validate_output(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.output.directory.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "output.directory",
                "Output directory must not be empty",
            ));
        }

        if config.output.title_max_chars == 0 {
            errors.push(ValidationError::new(
                "output.title_max_chars",
                "Title length must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_oversized_page() {
        let mut config = Config::default();
        config.api.page_size = 250;

        let result = ConfigValidator::validate(&config);
        match result {
            Err(UnspoolError::ConfigValidation { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "api.page_size");
            }
            other => panic!("Expected validation failure, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_rejects_zero_page() {
        let mut config = Config::default();
        config.api.page_size = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_collects_multiple_errors() {
        let mut config = Config::default();
        config.api.base_url = String::new();
        config.output.title_max_chars = 0;

        match ConfigValidator::validate(&config) {
            Err(UnspoolError::ConfigValidation { errors }) => {
                assert_eq!(errors.len(), 2);
            }
            _ => panic!("Expected validation failure"),
        }
    }
}
