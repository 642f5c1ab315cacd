//! tool.yml structural validator.
//!
//! Two-phase shape: serde_yaml produces the raw document, then validation
//! walks it permissively field by field so a single pass surfaces every
//! problem. Only two conditions abort early (non-mapping root, missing or
//! empty `tools` section); everything else accumulates into the report.

use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;

pub const ALLOWED_PARAMETER_TYPES: &[&str] =
    &["string", "integer", "float", "boolean", "enum", "asset"];

/// Parameter type of a tool-spec parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Float,
    Boolean,
    Enum,
    Asset,
}

impl ParameterType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "boolean" => Some(Self::Boolean),
            "enum" => Some(Self::Enum),
            "asset" => Some(Self::Asset),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::Asset => "asset",
        }
    }
}

/// A validated tool-spec parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterDef {
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub description: Option<String>,
    /// Allowed values, `enum` parameters only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub default: Option<Value>,
    pub array: bool,
    pub optional: bool,
}

/// A validated data-section entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DataDef {
    pub description: Option<String>,
    pub example: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<String>,
}

/// The data section comes in two shapes: a plain list of identifiers or a
/// mapping with per-entry detail.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolData {
    Entries(IndexMap<String, DataDef>),
    Names(Vec<String>),
}

impl ToolData {
    pub fn is_empty(&self) -> bool {
        match self {
            ToolData::Entries(map) => map.is_empty(),
            ToolData::Names(names) => names.is_empty(),
        }
    }

    /// Entry names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            ToolData::Entries(map) => map.keys().map(String::as_str).collect(),
            ToolData::Names(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl Default for ToolData {
    fn default() -> Self {
        ToolData::Names(Vec::new())
    }
}

/// The validated manifest of a single tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub title: String,
    pub description: String,
    pub parameters: IndexMap<String, ParameterDef>,
    pub data: ToolData,
}

/// Result record of [`validate_tool_yaml`]. Never an `Err`: unparseable
/// input becomes a structural error entry.
#[derive(Debug)]
pub struct ToolSpecValidation {
    pub is_valid: bool,
    pub tool_spec: Option<ToolSpec>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ToolSpecValidation {
    fn failed(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: false,
            tool_spec: None,
            errors,
            warnings,
        }
    }
}

/// Validate raw tool.yml text into a [`ToolSpec`], accumulating all errors
/// and warnings in one pass.
pub fn validate_tool_yaml(yaml: &str) -> ToolSpecValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let root: Value = match serde_yaml::from_str(yaml) {
        Ok(value) => value,
        Err(e) => {
            return ToolSpecValidation::failed(
                vec![format!("Failed to parse tool.yml as YAML: {e}")],
                warnings,
            );
        }
    };

    let Some(root_map) = root.as_mapping() else {
        return ToolSpecValidation::failed(
            vec!["tool.yml root must be a mapping".to_string()],
            warnings,
        );
    };

    let Some(tools) = root_map.get("tools").and_then(Value::as_mapping) else {
        return ToolSpecValidation::failed(
            vec!["tool.yml must contain a 'tools' section".to_string()],
            warnings,
        );
    };

    if tools.is_empty() {
        return ToolSpecValidation::failed(
            vec!["the 'tools' section must declare at least one tool".to_string()],
            warnings,
        );
    }

    // Policy, not an error: multiple tool entries select the first.
    let mut entries = tools.iter();
    let (tool_name, tool_value) = entries.next().expect("non-empty tools mapping");
    let discarded: Vec<String> = entries
        .map(|(k, _)| value_to_display(k))
        .collect();
    if !discarded.is_empty() {
        warnings.push(format!(
            "tool.yml declares multiple tools; only the first ('{}') is analyzed, ignoring: {}",
            value_to_display(tool_name),
            discarded.join(", ")
        ));
    }

    let tool_name = value_to_display(tool_name);
    let Some(tool) = tool_value.as_mapping() else {
        errors.push(format!("tool '{tool_name}' must be a mapping"));
        return ToolSpecValidation::failed(errors, warnings);
    };

    let title = require_string(tool, "title", &tool_name, &mut errors);
    let description = require_string(tool, "description", &tool_name, &mut errors);

    // Deprecated since tool-spec 1.0; the value is never propagated.
    if tool.get("version").is_some() {
        warnings.push(format!(
            "tool '{tool_name}' sets the deprecated 'version' field; it is ignored"
        ));
    }

    let parameters = validate_parameters(tool, &tool_name, &mut errors);
    let data = validate_data(tool, &tool_name, &mut errors);

    if errors.is_empty() {
        ToolSpecValidation {
            is_valid: true,
            tool_spec: Some(ToolSpec {
                name: tool_name,
                title: title.unwrap_or_default(),
                description: description.unwrap_or_default(),
                parameters,
                data,
            }),
            errors,
            warnings,
        }
    } else {
        ToolSpecValidation::failed(errors, warnings)
    }
}

fn require_string(
    tool: &serde_yaml::Mapping,
    field: &str,
    tool_name: &str,
    errors: &mut Vec<String>,
) -> Option<String> {
    match tool.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::String(_)) => {
            errors.push(format!("tool '{tool_name}' field '{field}' must not be empty"));
            None
        }
        Some(_) => {
            errors.push(format!("tool '{tool_name}' field '{field}' must be a string"));
            None
        }
        None => {
            errors.push(format!("tool '{tool_name}' is missing required field '{field}'"));
            None
        }
    }
}

fn validate_parameters(
    tool: &serde_yaml::Mapping,
    tool_name: &str,
    errors: &mut Vec<String>,
) -> IndexMap<String, ParameterDef> {
    let mut parameters = IndexMap::new();

    let raw = match tool.get("parameters") {
        None => return parameters,
        Some(Value::Null) => return parameters,
        Some(Value::Mapping(map)) => map,
        Some(_) => {
            errors.push(format!("tool '{tool_name}' 'parameters' must be a mapping"));
            return parameters;
        }
    };

    for (key, value) in raw {
        let param_name = value_to_display(key);
        let Some(def) = value.as_mapping() else {
            errors.push(format!("parameter '{param_name}' must be a mapping"));
            continue;
        };

        let kind = match def.get("type") {
            None => {
                errors.push(format!("parameter '{param_name}' is missing required field 'type'"));
                continue;
            }
            Some(Value::String(raw_type)) => match ParameterType::parse(raw_type) {
                Some(kind) => kind,
                None => {
                    errors.push(format!(
                        "parameter '{param_name}' has unknown type '{raw_type}' (allowed: {})",
                        ALLOWED_PARAMETER_TYPES.join(", ")
                    ));
                    continue;
                }
            },
            Some(_) => {
                errors.push(format!("parameter '{param_name}' field 'type' must be a string"));
                continue;
            }
        };

        let array = bool_field(def, "array", &param_name, errors);
        let optional = bool_field(def, "optional", &param_name, errors);

        let mut values = Vec::new();
        match (kind, def.get("values")) {
            (ParameterType::Enum, Some(Value::Sequence(seq))) if !seq.is_empty() => {
                values = seq.iter().map(value_to_display).collect();
                // One error mentioning both fields when they clash.
                if array == Some(true) {
                    errors.push(format!(
                        "parameter '{param_name}' cannot combine type 'enum' with 'array: true'"
                    ));
                }
            }
            (ParameterType::Enum, Some(Value::Sequence(_))) | (ParameterType::Enum, None) => {
                errors.push(format!(
                    "enum parameter '{param_name}' requires a non-empty 'values' list"
                ));
            }
            (ParameterType::Enum, Some(_)) => {
                errors.push(format!(
                    "enum parameter '{param_name}' field 'values' must be a list"
                ));
            }
            (_, Some(_)) => {
                errors.push(format!(
                    "parameter '{param_name}' declares 'values' but is not of type 'enum'"
                ));
            }
            (_, None) => {}
        }

        let min = numeric_field(def, "min", kind, &param_name, errors);
        let max = numeric_field(def, "max", kind, &param_name, errors);
        if let (Some(min), Some(max)) = (min, max)
            && min >= max
        {
            errors.push(format!(
                "parameter '{param_name}' requires min < max (got min={min}, max={max})"
            ));
        }

        let description = def
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let default = def.get("default").cloned();

        parameters.insert(
            param_name,
            ParameterDef {
                kind,
                description,
                values,
                min,
                max,
                default,
                array: array.unwrap_or(false),
                optional: optional.unwrap_or(false),
            },
        );
    }

    parameters
}

fn bool_field(
    def: &serde_yaml::Mapping,
    field: &str,
    param_name: &str,
    errors: &mut Vec<String>,
) -> Option<bool> {
    match def.get(field) {
        None => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            errors.push(format!(
                "parameter '{param_name}' field '{field}' must be a boolean"
            ));
            None
        }
    }
}

fn numeric_field(
    def: &serde_yaml::Mapping,
    field: &str,
    kind: ParameterType,
    param_name: &str,
    errors: &mut Vec<String>,
) -> Option<f64> {
    match def.get(field) {
        None => None,
        Some(Value::Number(n)) => {
            if !kind.is_numeric() {
                errors.push(format!(
                    "parameter '{param_name}' field '{field}' is only valid for numeric types"
                ));
                None
            } else {
                n.as_f64()
            }
        }
        Some(_) => {
            errors.push(format!(
                "parameter '{param_name}' field '{field}' must be a number"
            ));
            None
        }
    }
}

fn validate_data(
    tool: &serde_yaml::Mapping,
    tool_name: &str,
    errors: &mut Vec<String>,
) -> ToolData {
    match tool.get("data") {
        None | Some(Value::Null) => ToolData::default(),
        Some(Value::Sequence(seq)) => {
            let mut names = Vec::new();
            for entry in seq {
                match entry {
                    Value::String(s) => names.push(s.clone()),
                    other => errors.push(format!(
                        "tool '{tool_name}' data list entries must be strings, got {}",
                        value_kind(other)
                    )),
                }
            }
            ToolData::Names(names)
        }
        Some(Value::Mapping(map)) => {
            let mut entries = IndexMap::new();
            for (key, value) in map {
                let data_name = value_to_display(key);
                let def = match value {
                    Value::Null => DataDef::default(),
                    Value::Mapping(def_map) => {
                        let extension = match def_map.get("extension") {
                            None | Some(Value::Null) => Vec::new(),
                            Some(Value::String(s)) => vec![s.clone()],
                            Some(Value::Sequence(seq))
                                if seq.iter().all(|v| v.is_string()) =>
                            {
                                seq.iter().map(value_to_display).collect()
                            }
                            Some(_) => {
                                errors.push(format!(
                                    "data entry '{data_name}' field 'extension' must be a string or list of strings"
                                ));
                                Vec::new()
                            }
                        };
                        DataDef {
                            description: def_map
                                .get("description")
                                .and_then(Value::as_str)
                                .map(str::to_string),
                            example: def_map
                                .get("example")
                                .and_then(Value::as_str)
                                .map(str::to_string),
                            extension,
                        }
                    }
                    other => {
                        errors.push(format!(
                            "data entry '{data_name}' must be a mapping, got {}",
                            value_kind(other)
                        ));
                        continue;
                    }
                };
                entries.insert(data_name, def);
            }
            ToolData::Entries(entries)
        }
        Some(other) => {
            errors.push(format!(
                "tool '{tool_name}' 'data' must be a list or mapping, got {}",
                value_kind(other)
            ));
            ToolData::default()
        }
    }
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
tools:
  mytool:
    title: My Tool
    description: Does something useful.
"#;

    #[test]
    fn accepts_minimal_manifest() {
        let result = validate_tool_yaml(MINIMAL);
        assert!(result.is_valid, "errors: {:?}", result.errors);
        let spec = result.tool_spec.unwrap();
        assert_eq!(spec.title, "My Tool");
        assert_eq!(spec.description, "Does something useful.");
        assert!(spec.parameters.is_empty());
    }

    #[test]
    fn rejects_missing_tools_section() {
        let result = validate_tool_yaml("title: nope");
        assert!(!result.is_valid);
        assert!(result.tool_spec.is_none());
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn rejects_empty_tools_section() {
        let result = validate_tool_yaml("tools: {}");
        assert!(!result.is_valid);
        assert!(result.tool_spec.is_none());
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn unparseable_yaml_reports_instead_of_panicking() {
        let result = validate_tool_yaml(": [unbalanced");
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("parse"));
    }

    #[test]
    fn multiple_tools_selects_first_with_warning() {
        let yaml = r#"
tools:
  first:
    title: First
    description: one
  second:
    title: Second
    description: two
"#;
        let result = validate_tool_yaml(yaml);
        assert!(result.is_valid);
        assert_eq!(result.tool_spec.unwrap().title, "First");
        assert!(
            result.warnings.iter().any(|w| w.contains("second")),
            "warning should name the discarded tool: {:?}",
            result.warnings
        );
    }

    #[test]
    fn deprecated_version_warns_and_is_dropped() {
        let yaml = r#"
tools:
  mytool:
    title: T
    description: D
    version: "1.2"
"#;
        let result = validate_tool_yaml(yaml);
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("version")));
    }

    #[test]
    fn enum_with_array_yields_single_error_naming_both() {
        let yaml = r#"
tools:
  mytool:
    title: T
    description: D
    parameters:
      mode:
        type: enum
        values: [a, b]
        array: true
"#;
        let result = validate_tool_yaml(yaml);
        assert!(!result.is_valid);
        let matching: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.contains("enum") && e.contains("array"))
            .collect();
        assert_eq!(matching.len(), 1, "errors: {:?}", result.errors);
    }

    #[test]
    fn min_not_below_max_is_an_error() {
        let yaml = r#"
tools:
  mytool:
    title: T
    description: D
    parameters:
      threshold:
        type: float
        min: 1.0
        max: 1.0
"#;
        let result = validate_tool_yaml(yaml);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("min < max")));
    }

    #[test]
    fn valid_range_produces_no_range_error() {
        let yaml = r#"
tools:
  mytool:
    title: T
    description: D
    parameters:
      threshold:
        type: float
        min: 0.0
        max: 1.0
"#;
        let result = validate_tool_yaml(yaml);
        assert!(result.is_valid, "errors: {:?}", result.errors);
        let spec = result.tool_spec.unwrap();
        let param = &spec.parameters["threshold"];
        assert_eq!(param.min, Some(0.0));
        assert_eq!(param.max, Some(1.0));
    }

    #[test]
    fn unknown_type_enumerates_allowed_set() {
        let yaml = r#"
tools:
  mytool:
    title: T
    description: D
    parameters:
      x:
        type: complex
"#;
        let result = validate_tool_yaml(yaml);
        assert!(!result.is_valid);
        let err = result
            .errors
            .iter()
            .find(|e| e.contains("unknown type"))
            .expect("unknown type error");
        for allowed in ALLOWED_PARAMETER_TYPES {
            assert!(err.contains(allowed), "{err} should list {allowed}");
        }
    }

    #[test]
    fn errors_accumulate_across_fields() {
        let yaml = r#"
tools:
  mytool:
    description: ""
    parameters:
      a:
        type: nope
      b:
        array: yes
"#;
        let result = validate_tool_yaml(yaml);
        assert!(!result.is_valid);
        // missing title, empty description, unknown type, missing type
        assert!(result.errors.len() >= 4, "errors: {:?}", result.errors);
    }

    #[test]
    fn data_as_string_list() {
        let yaml = r#"
tools:
  mytool:
    title: T
    description: D
    data:
      - observations
      - timeseries
"#;
        let result = validate_tool_yaml(yaml);
        assert!(result.is_valid);
        let spec = result.tool_spec.unwrap();
        assert_eq!(spec.data.names(), vec!["observations", "timeseries"]);
    }

    #[test]
    fn data_as_mapping_with_extensions() {
        let yaml = r#"
tools:
  mytool:
    title: T
    description: D
    data:
      observations:
        description: Input table
        extension: csv
      raster:
        extension: [tif, tiff]
"#;
        let result = validate_tool_yaml(yaml);
        assert!(result.is_valid, "errors: {:?}", result.errors);
        let spec = result.tool_spec.unwrap();
        let ToolData::Entries(entries) = &spec.data else {
            panic!("expected mapping-shaped data");
        };
        assert_eq!(entries["observations"].extension, vec!["csv"]);
        assert_eq!(entries["raster"].extension, vec!["tif", "tiff"]);
    }

    #[test]
    fn data_of_wrong_shape_is_an_error() {
        let yaml = r#"
tools:
  mytool:
    title: T
    description: D
    data: 42
"#;
        let result = validate_tool_yaml(yaml);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("'data'")));
    }
}
