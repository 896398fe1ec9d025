//! Per-tool parameter constraints carried by capability tokens.
//!
//! Constraints narrow a granted tool to a subset of its parameter space,
//! e.g. restricting `send_email` recipients to a company domain. The set of
//! predicate kinds is an open extension point; a constraint referencing a
//! parameter that was not supplied passes, since constraints scope supplied
//! values rather than mandate presence.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A predicate over the named parameters supplied to a tool invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterConstraint {
    /// The supplied value must equal one of the listed values.
    AllowedValues {
        /// Parameter the constraint applies to.
        parameter: String,
        /// Acceptable values.
        values: Vec<Value>,
    },
    /// The supplied value must be a number within the inclusive range.
    NumericRange {
        /// Parameter the constraint applies to.
        parameter: String,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// The supplied string value must end with one of the listed suffixes.
    AllowedSuffixes {
        /// Parameter the constraint applies to.
        parameter: String,
        /// Acceptable suffixes (e.g. `@example.com`).
        suffixes: Vec<String>,
    },
}

impl ParameterConstraint {
    /// Returns the name of the parameter the constraint applies to.
    #[must_use]
    pub fn parameter(&self) -> &str {
        match self {
            Self::AllowedValues { parameter, .. }
            | Self::NumericRange { parameter, .. }
            | Self::AllowedSuffixes { parameter, .. } => parameter,
        }
    }

    /// Checks the constraint against the supplied invocation parameters.
    ///
    /// # Errors
    ///
    /// Returns a human-readable violation reason when the supplied value
    /// falls outside the constraint.
    pub fn check(&self, parameters: &Map<String, Value>) -> std::result::Result<(), String> {
        let Some(value) = parameters.get(self.parameter()) else {
            return Ok(());
        };

        match self {
            Self::AllowedValues { parameter, values } => {
                if values.contains(value) {
                    Ok(())
                } else {
                    Err(format!("value of `{parameter}` is not in the allowed set"))
                }
            }
            Self::NumericRange {
                parameter,
                min,
                max,
            } => {
                let Some(number) = value.as_f64() else {
                    return Err(format!("`{parameter}` must be a number"));
                };
                if number >= *min && number <= *max {
                    Ok(())
                } else {
                    Err(format!(
                        "`{parameter}` value {number} is outside [{min}, {max}]"
                    ))
                }
            }
            Self::AllowedSuffixes {
                parameter,
                suffixes,
            } => {
                let Some(text) = value.as_str() else {
                    return Err(format!("`{parameter}` must be a string"));
                };
                if suffixes.iter().any(|suffix| text.ends_with(suffix)) {
                    Ok(())
                } else {
                    Err(format!(
                        "`{parameter}` does not end with an allowed suffix"
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn absent_parameter_passes() {
        let constraint = ParameterConstraint::NumericRange {
            parameter: "count".into(),
            min: 1.0,
            max: 10.0,
        };
        assert!(constraint.check(&Map::new()).is_ok());
    }

    #[test]
    fn numeric_range_enforced() {
        let constraint = ParameterConstraint::NumericRange {
            parameter: "count".into(),
            min: 1.0,
            max: 10.0,
        };
        assert!(constraint.check(&params(&[("count", json!(5))])).is_ok());
        assert!(constraint.check(&params(&[("count", json!(11))])).is_err());
        assert!(constraint.check(&params(&[("count", json!("5"))])).is_err());
    }

    #[test]
    fn suffix_allow_list_enforced() {
        let constraint = ParameterConstraint::AllowedSuffixes {
            parameter: "to".into(),
            suffixes: vec!["@example.com".into()],
        };
        assert!(
            constraint
                .check(&params(&[("to", json!("alice@example.com"))]))
                .is_ok()
        );
        assert!(
            constraint
                .check(&params(&[("to", json!("attacker@evil.com"))]))
                .is_err()
        );
    }

    #[test]
    fn allowed_values_enforced() {
        let constraint = ParameterConstraint::AllowedValues {
            parameter: "mode".into(),
            values: vec![json!("summary"), json!("full")],
        };
        assert!(constraint.check(&params(&[("mode", json!("full"))])).is_ok());
        assert!(
            constraint
                .check(&params(&[("mode", json!("raw"))]))
                .is_err()
        );
    }
}
