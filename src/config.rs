use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{AgreementError, Result};

/// engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// prefix for generated agreement numbers (e.g. "AGR" -> AGR-2024-00001)
    pub number_prefix: String,
    /// policy driving the automatic active -> defaulted transition; None disables it
    pub default_policy: Option<DefaultPolicy>,
    /// floor for the monthly amount an operator may propose
    pub minimum_installment: Option<Money>,
}

/// external policy parameter for declaring an agreement unrecoverable.
/// the trigger is a configured threshold, never a built-in constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultPolicy {
    /// consecutive overdue installments, counted from the earliest unpaid one
    pub max_consecutive_overdue: u32,
}

impl EngineConfig {
    /// standard configuration: AGR numbering, no automatic default
    pub fn standard() -> Self {
        Self {
            number_prefix: "AGR".to_string(),
            default_policy: None,
            minimum_installment: None,
        }
    }

    /// standard configuration with an automatic default trigger
    pub fn with_default_policy(max_consecutive_overdue: u32) -> Self {
        Self {
            default_policy: Some(DefaultPolicy {
                max_consecutive_overdue,
            }),
            ..Self::standard()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.number_prefix.is_empty() {
            return Err(AgreementError::InvalidConfiguration {
                message: "number prefix must not be empty".to_string(),
            });
        }

        if let Some(policy) = &self.default_policy {
            if policy.max_consecutive_overdue == 0 {
                return Err(AgreementError::InvalidConfiguration {
                    message: "default policy threshold must be at least 1".to_string(),
                });
            }
        }

        if let Some(minimum) = self.minimum_installment {
            if !minimum.is_positive() {
                return Err(AgreementError::InvalidConfiguration {
                    message: "minimum installment must be positive".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_config_is_valid() {
        assert!(EngineConfig::standard().validate().is_ok());
        assert!(EngineConfig::with_default_policy(3).validate().is_ok());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = EngineConfig::with_default_policy(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let config = EngineConfig {
            number_prefix: String::new(),
            ..EngineConfig::standard()
        };
        assert!(config.validate().is_err());
    }
}
