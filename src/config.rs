//! Runtime configuration for the codec and its backends.

use crate::error::InlinkError;

/// Parameters fixed at codec construction time.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Bytes per conversion group for the digit backends.
    pub group_width: usize,
    /// Payloads strictly below this byte count use the small-data layout.
    pub small_threshold: usize,
    /// Payloads at or above this byte count are eligible for the parallel
    /// backend.
    pub parallel_threshold: usize,
    /// Fraction of the symbol count assumed recoverable by the legacy
    /// salvage decoder. Empirical, not a correctness requirement.
    pub legacy_length_ratio: f64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            group_width: 4,
            small_threshold: 64,
            parallel_threshold: 50 * 1024,
            legacy_length_ratio: 0.6,
        }
    }
}

impl CodecConfig {
    /// Check the configuration for values the backends cannot honour.
    pub fn validate(&self) -> Result<(), InlinkError> {
        if self.group_width == 0 || self.group_width > 8 {
            return Err(InlinkError::Config(format!(
                "group_width must be 1..=8, got {}",
                self.group_width
            )));
        }
        if !(0.0..=1.0).contains(&self.legacy_length_ratio) {
            return Err(InlinkError::Config(format!(
                "legacy_length_ratio must be within 0..=1, got {}",
                self.legacy_length_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(CodecConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_oversized_group() {
        let cfg = CodecConfig { group_width: 9, ..CodecConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
