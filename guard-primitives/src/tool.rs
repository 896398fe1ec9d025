//! Tool definitions describing what an agent may be permitted to invoke.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 64;

/// Declared type tag for a tool parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// UTF-8 text.
    String,
    /// Integer or floating-point number.
    Number,
    /// True/false flag.
    Boolean,
    /// Nested JSON object.
    Object,
    /// JSON array.
    Array,
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        })
    }
}

/// A single named parameter accepted by a tool.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    name: String,
    kind: ParameterType,
    description: String,
    #[serde(default)]
    required: bool,
}

impl ToolParameter {
    /// Creates a new optional parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDefinition`] when the parameter name is empty.
    pub fn new(
        name: impl Into<String>,
        kind: ParameterType,
        description: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_definition("parameter name cannot be empty"));
        }
        Ok(Self {
            name,
            kind,
            description: description.into(),
            required: false,
        })
    }

    /// Marks the parameter as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type tag.
    #[must_use]
    pub const fn kind(&self) -> ParameterType {
        self.kind
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns whether the parameter is required.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// Risk attributed to a tool on a monotonic 1..=5 scale.
///
/// 1 is read-only, 5 is destructive. Ordering follows the scale.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskLevel(u8);

impl RiskLevel {
    /// Read-only operations with no side effects.
    pub const READ_ONLY: Self = Self(1);
    /// Irreversible or destructive operations.
    pub const DESTRUCTIVE: Self = Self(5);

    /// Creates a risk level after validating the 1..=5 range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDefinition`] when the level is outside 1..=5.
    pub fn new(level: u8) -> Result<Self> {
        if !(1..=5).contains(&level) {
            return Err(Error::invalid_definition(format!(
                "risk level must be within 1..=5, got {level}"
            )));
        }
        Ok(Self(level))
    }

    /// Returns the numeric level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable description of a registerable tool.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    name: String,
    description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<ToolParameter>,
    risk_level: RiskLevel,
}

impl ToolDefinition {
    /// Starts building a tool definition for the supplied name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDefinition`] when the name is empty, too long,
    /// or contains unsupported characters.
    pub fn builder(name: impl Into<String>) -> Result<ToolDefinitionBuilder> {
        let name = name.into();
        validate_tool_name(&name)?;
        Ok(ToolDefinitionBuilder {
            name,
            description: None,
            parameters: Vec::new(),
            risk_level: None,
        })
    }

    /// Returns the globally unique tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the ordered parameter sequence.
    #[must_use]
    pub fn parameters(&self) -> &[ToolParameter] {
        &self.parameters
    }

    /// Returns the attributed risk level.
    #[must_use]
    pub const fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }
}

/// Builder for [`ToolDefinition`].
#[derive(Debug)]
pub struct ToolDefinitionBuilder {
    name: String,
    description: Option<String>,
    parameters: Vec<ToolParameter>,
    risk_level: Option<RiskLevel>,
}

impl ToolDefinitionBuilder {
    /// Sets the human-readable description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDefinition`] when the description is empty.
    pub fn description(mut self, description: impl Into<String>) -> Result<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(Error::invalid_definition("description cannot be empty"));
        }
        self.description = Some(description);
        Ok(self)
    }

    /// Sets the risk level.
    #[must_use]
    pub fn risk_level(mut self, level: RiskLevel) -> Self {
        self.risk_level = Some(level);
        self
    }

    /// Appends a parameter, preserving declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDefinition`] when a parameter with the same
    /// name was already added.
    pub fn add_parameter(mut self, parameter: ToolParameter) -> Result<Self> {
        if self.parameters.iter().any(|p| p.name() == parameter.name()) {
            return Err(Error::invalid_definition(format!(
                "duplicate parameter name `{}`",
                parameter.name()
            )));
        }
        self.parameters.push(parameter);
        Ok(self)
    }

    /// Finalises the tool definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDefinition`] when the description or risk
    /// level was not provided.
    pub fn build(self) -> Result<ToolDefinition> {
        let description = self.description.ok_or_else(|| {
            Error::invalid_definition("description must be provided")
        })?;
        let risk_level = self.risk_level.ok_or_else(|| {
            Error::invalid_definition("risk level must be provided")
        })?;

        Ok(ToolDefinition {
            name: self.name,
            description,
            parameters: self.parameters,
            risk_level,
        })
    }
}

fn validate_tool_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_definition("tool name cannot be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::invalid_definition(format!(
            "tool name length must be <= {MAX_NAME_LEN}"
        )));
    }
    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_' | '.'))
    {
        return Err(Error::invalid_definition(
            "tool name must contain lowercase alphanumeric, dash, underscore, or dot",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_definition_success() {
        let definition = ToolDefinition::builder("send_email")
            .and_then(|b| b.description("Send an email message"))
            .map(|b| b.risk_level(RiskLevel::new(4).unwrap()))
            .and_then(|b| {
                b.add_parameter(
                    ToolParameter::new("to", ParameterType::String, "Recipient")
                        .unwrap()
                        .required(),
                )
            })
            .and_then(|b| {
                b.add_parameter(
                    ToolParameter::new("subject", ParameterType::String, "Subject").unwrap(),
                )
            })
            .and_then(ToolDefinitionBuilder::build)
            .expect("build");

        assert_eq!(definition.name(), "send_email");
        assert_eq!(definition.parameters().len(), 2);
        assert!(definition.parameters()[0].is_required());
        assert_eq!(definition.risk_level().value(), 4);
    }

    #[test]
    fn rejects_invalid_names() {
        assert!(ToolDefinition::builder("").is_err());
        assert!(ToolDefinition::builder("Send Email").is_err());
        assert!(ToolDefinition::builder("a".repeat(65)).is_err());
    }

    #[test]
    fn rejects_duplicate_parameters() {
        let err = ToolDefinition::builder("read_web")
            .and_then(|b| b.description("Read a website"))
            .and_then(|b| {
                b.add_parameter(ToolParameter::new("url", ParameterType::String, "URL").unwrap())
            })
            .and_then(|b| {
                b.add_parameter(ToolParameter::new("url", ParameterType::String, "URL").unwrap())
            })
            .expect_err("duplicate parameter should fail");

        assert!(matches!(err, Error::InvalidDefinition { .. }));
    }

    #[test]
    fn risk_level_bounds() {
        assert!(RiskLevel::new(0).is_err());
        assert!(RiskLevel::new(6).is_err());
        assert!(RiskLevel::new(3).is_ok());
        assert!(RiskLevel::READ_ONLY < RiskLevel::DESTRUCTIVE);
    }
}
