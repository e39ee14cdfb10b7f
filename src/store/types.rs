use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Where a parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterKind {
    /// A static value shared by every company, e.g. a country rate.
    Global,
    /// A static value looked up per company.
    Company,
    /// Supplied at calculation time through the input map.
    #[serde(alias = "INPUT")]
    User,
    /// Derived from a formula over other parameters.
    Calculation,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::Global => "GLOBAL",
            ParameterKind::Company => "COMPANY",
            ParameterKind::User => "USER",
            ParameterKind::Calculation => "CALCULATION",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque unit label such as `USD/kWh` or `MW`.
///
/// The empty label and `"dimensionless"` both denote a pure number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit(pub String);

impl Unit {
    pub fn dimensionless() -> Self {
        Unit(String::new())
    }

    pub fn is_dimensionless(&self) -> bool {
        let label = self.0.trim();
        label.is_empty() || label == "1" || label.eq_ignore_ascii_case("dimensionless")
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            f.write_str("dimensionless")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// The caller-supplied definition of one parameter, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(alias = "type")]
    pub kind: ParameterKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

/// One or many requested target names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Single(String),
    Many(Vec<String>),
}

impl Target {
    pub fn names(&self) -> &[String] {
        match self {
            Target::Single(name) => std::slice::from_ref(name),
            Target::Many(names) => names,
        }
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Single(name.to_string())
    }
}

impl From<Vec<&str>> for Target {
    fn from(names: Vec<&str>) -> Self {
        Target::Many(names.into_iter().map(str::to_string).collect())
    }
}

/// The shape of the result mirrors the shape of the `Target` that requested it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalculationResult {
    Single(f64),
    Many(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub inputs: HashMap<String, f64>,
    pub target: Target,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub result: CalculationResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_both_target_forms() {
        let single: CalculationRequest = serde_json::from_str(
            r#"{
                "parameters": [
                    {"name": "rate", "kind": "GLOBAL", "value": 0.2, "unit": "ratio"},
                    {"name": "base", "type": "INPUT"},
                    {"name": "out", "kind": "CALCULATION", "formula": "base * rate"}
                ],
                "inputs": {"base": 10},
                "target": "out"
            }"#,
        )
        .unwrap();
        assert_eq!(single.target, Target::Single("out".into()));
        assert_eq!(single.parameters[1].kind, ParameterKind::User);
        assert_eq!(single.parameters[0].unit.as_deref(), Some("ratio"));

        let many: CalculationRequest =
            serde_json::from_str(r#"{"parameters": [], "target": ["a", "b"]}"#).unwrap();
        assert_eq!(many.target.names(), ["a".to_string(), "b".to_string()]);
        assert!(many.inputs.is_empty());
    }

    #[test]
    fn test_response_serializes_untagged() {
        let single = CalculationResponse { result: CalculationResult::Single(550.0) };
        assert_eq!(serde_json::to_string(&single).unwrap(), r#"{"result":550.0}"#);

        let many = CalculationResponse { result: CalculationResult::Many(vec![16.0, 48.0]) };
        assert_eq!(serde_json::to_string(&many).unwrap(), r#"{"result":[16.0,48.0]}"#);
    }

    #[test]
    fn test_dimensionless_labels() {
        assert!(Unit::dimensionless().is_dimensionless());
        assert!(Unit("dimensionless".into()).is_dimensionless());
        assert!(!Unit("USD".into()).is_dimensionless());
    }
}
