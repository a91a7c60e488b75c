use crate::constants::descriptor::SOURCE_SEPARATOR;
use crate::errors::ResolveError;
use crate::types::WeightValue;

/// Per-source sampling weights parsed from a `::`-separated string.
///
/// Each weight keeps the caller's original text so re-emitted weight strings
/// are byte-identical to the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightSpec {
    values: Vec<WeightValue>,
}

impl WeightSpec {
    /// Parse `raw`, requiring every entry to be a finite, non-negative number.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let mut values = Vec::new();
        for entry in raw.split(SOURCE_SEPARATOR) {
            let parsed: f64 = entry
                .trim()
                .parse()
                .map_err(|_| ResolveError::InvalidWeight(entry.to_string()))?;
            if !parsed.is_finite() || parsed < 0.0 {
                return Err(ResolveError::InvalidWeight(entry.to_string()));
            }
            values.push(entry.to_string());
        }
        Ok(Self { values })
    }

    /// Weights in source order, as the caller wrote them.
    pub fn values(&self) -> &[WeightValue] {
        &self.values
    }

    /// Fail unless there is exactly one weight per source.
    pub fn check_cardinality(&self, sources: usize) -> Result<(), ResolveError> {
        if self.values.len() != sources {
            return Err(ResolveError::WeightCardinality {
                sources,
                weights: self.values.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_original_text() {
        let spec = WeightSpec::parse("1::2.50::0").unwrap();
        assert_eq!(spec.values(), ["1", "2.50", "0"]);
        assert!(spec.check_cardinality(3).is_ok());
    }

    #[test]
    fn parse_rejects_non_numeric_and_negative() {
        assert!(matches!(
            WeightSpec::parse("1::heavy"),
            Err(ResolveError::InvalidWeight(value)) if value == "heavy"
        ));
        assert!(WeightSpec::parse("-1").is_err());
        assert!(WeightSpec::parse("inf").is_err());
        assert!(WeightSpec::parse("1::::2").is_err());
    }

    #[test]
    fn cardinality_mismatch_is_reported() {
        let spec = WeightSpec::parse("1::2").unwrap();
        assert!(matches!(
            spec.check_cardinality(3),
            Err(ResolveError::WeightCardinality {
                sources: 3,
                weights: 2
            })
        ));
    }
}
