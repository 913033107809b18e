use core_types::Target;
use derive_more::From;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Whether/how a kernel may be fused with its neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FusionType {
    Opaque,
    #[serde(rename = "ELEMWISE")]
    ElemWise,
    #[serde(rename = "COMMREDUCE")]
    CommReduce,
    Segment,
    Convolution,
    Matmul,
    Dynamic,
}

/// Whether a port or attribute must be supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Required,
    Optional,
    Dynamic,
}

/// Shape constraint a port places on its tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeSupport {
    All,
    FormatAgnostic,
}

/// Declared type of a scalar attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrType {
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "listInt")]
    ListInt,
    #[serde(rename = "listFloat")]
    ListFloat,
    #[serde(rename = "listBool")]
    ListBool,
    #[serde(rename = "listStr")]
    ListStr,
}

impl AttrType {
    pub fn is_list(self) -> bool {
        matches!(self, AttrType::ListInt | AttrType::ListFloat | AttrType::ListBool | AttrType::ListStr)
    }
}

/// A typed attribute value
#[derive(Debug, Clone, PartialEq, From)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    ListInt(Vec<i64>),
    ListFloat(Vec<f64>),
    ListBool(Vec<bool>),
    ListStr(Vec<String>),
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl AttrValue {
    pub fn attr_type(&self) -> AttrType {
        match self {
            AttrValue::Int(_)       => AttrType::Int,
            AttrValue::Float(_)     => AttrType::Float,
            AttrValue::Bool(_)      => AttrType::Bool,
            AttrValue::Str(_)       => AttrType::Str,
            AttrValue::ListInt(_)   => AttrType::ListInt,
            AttrValue::ListFloat(_) => AttrType::ListFloat,
            AttrValue::ListBool(_)  => AttrType::ListBool,
            AttrValue::ListStr(_)   => AttrType::ListStr,
        }
    }

    /// Parse the registration-record spelling of a value as `ty`.
    /// Lists are comma separated; an empty string is an empty list.
    pub fn parse(ty: AttrType, s: &str) -> Result<Self, String> {
        let s = s.trim();
        Ok(match ty {
            AttrType::Int       => AttrValue::Int(parse_int(s)?),
            AttrType::Float     => AttrValue::Float(parse_float(s)?),
            AttrType::Bool      => AttrValue::Bool(parse_bool(s)?),
            AttrType::Str       => AttrValue::Str(s.to_string()),
            AttrType::ListInt   => AttrValue::ListInt(parse_list(s, parse_int)?),
            AttrType::ListFloat => AttrValue::ListFloat(parse_list(s, parse_float)?),
            AttrType::ListBool  => AttrValue::ListBool(parse_list(s, parse_bool)?),
            AttrType::ListStr   => AttrValue::ListStr(parse_list(s, |e| Ok(e.to_string()))?),
        })
    }
}

fn parse_int(s: &str) -> Result<i64, String> {
    s.parse().map_err(|_| format!("'{s}' is not an int"))
}

fn parse_float(s: &str) -> Result<f64, String> {
    s.parse().map_err(|_| format!("'{s}' is not a float"))
}

fn parse_bool(s: &str) -> Result<bool, String> {
    if s.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if s.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("'{s}' is not a bool"))
    }
}

fn parse_list<T>(s: &str, elem: impl Fn(&str) -> Result<T, String>) -> Result<Vec<T>, String> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(',').map(|e| elem(e.trim())).collect()
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Writes the registration-record spelling, which `AttrValue::parse` reads back
impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v)       => write!(f, "{v}"),
            AttrValue::Float(v)     => write!(f, "{v}"),
            AttrValue::Bool(v)      => write!(f, "{v}"),
            AttrValue::Str(v)       => f.write_str(v),
            AttrValue::ListInt(v)   => join(f, v),
            AttrValue::ListFloat(v) => join(f, v),
            AttrValue::ListBool(v)  => join(f, v),
            AttrValue::ListStr(v)   => join(f, v),
        }
    }
}

/// Values an attribute may take
#[derive(Debug, Clone, PartialEq)]
pub enum AllowedValues {
    All,
    Set(Vec<AttrValue>),
}

impl AllowedValues {
    /// `"all"` or a comma separated list of scalars of type `ty`
    pub fn parse(ty: AttrType, s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s == "all" {
            return Ok(AllowedValues::All);
        }
        if ty.is_list() {
            return Err(format!("list attribute must allow 'all', got '{s}'"));
        }
        let set = s
            .split(',')
            .map(|v| AttrValue::parse(ty, v))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AllowedValues::Set(set))
    }

    pub fn permits(&self, value: &AttrValue) -> bool {
        match self {
            AllowedValues::All      => true,
            AllowedValues::Set(set) => set.contains(value),
        }
    }
}

impl fmt::Display for AllowedValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowedValues::All      => f.write_str("all"),
            AllowedValues::Set(set) => join(f, set),
        }
    }
}

/// One non-tensor parameter of an operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AttrRecord", into = "AttrRecord")]
pub struct AttrDef {
    pub name:       String,
    pub param_type: ParamType,
    pub attr_type:  AttrType,
    pub allowed:    AllowedValues,
    pub default:    Option<AttrValue>,
}

impl AttrDef {
    /// Build from the registration spelling, checking that the default is
    /// representable as `attr_type` and is permitted by `allowed`.
    pub fn parse(
        name:       &str,
        param_type: ParamType,
        attr_type:  AttrType,
        allowed:    &str,
        default:    Option<&str>,
    ) -> Result<Self, String> {
        let allowed = AllowedValues::parse(attr_type, allowed)?;
        let default = default.map(|d| AttrValue::parse(attr_type, d)).transpose()?;
        if let Some(d) = &default {
            if !allowed.permits(d) {
                return Err(format!("default '{d}' is not one of '{allowed}'"));
            }
        }
        Ok(Self { name: name.to_string(), param_type, attr_type, allowed, default })
    }

    /// Check a caller-supplied value against the declaration
    pub fn check(&self, value: &AttrValue) -> Result<(), String> {
        if value.attr_type() != self.attr_type {
            return Err(format!(
                "expected {:?}, got {:?} '{value}'",
                self.attr_type,
                value.attr_type(),
            ));
        }
        if !self.allowed.permits(value) {
            return Err(format!("'{value}' is not one of '{}'", self.allowed));
        }
        Ok(())
    }
}

/// Wire form of an attribute: values kept as registration strings
#[derive(Serialize, Deserialize)]
struct AttrRecord {
    name:          String,
    param_type:    ParamType,
    #[serde(rename = "type")]
    attr_type:     AttrType,
    value:         String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<String>,
}

impl TryFrom<AttrRecord> for AttrDef {
    type Error = String;

    fn try_from(r: AttrRecord) -> Result<Self, Self::Error> {
        AttrDef::parse(&r.name, r.param_type, r.attr_type, &r.value, r.default_value.as_deref())
            .map_err(|reason| format!("attribute '{}': {reason}", r.name))
    }
}

impl From<AttrDef> for AttrRecord {
    fn from(a: AttrDef) -> Self {
        AttrRecord {
            value:         a.allowed.to_string(),
            default_value: a.default.as_ref().map(ToString::to_string),
            name:          a.name,
            param_type:    a.param_type,
            attr_type:     a.attr_type,
        }
    }
}

/// One input or output port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoDef {
    pub index:      usize,
    pub name:       String,
    pub variadic:   bool,
    pub param_type: ParamType,
    pub shape:      ShapeSupport,
}

/// Errors raised while building, registering or querying descriptors
#[derive(Debug, Error)]
pub enum OpError {
    #[error("op '{op}' is already registered for target {target}")]
    DuplicateRegistration { op: String, target: Target },

    #[error("op '{op}' is missing required field(s): {}", .missing.join(", "))]
    IncompleteDescriptor { op: String, missing: Vec<&'static str> },

    #[error("unknown op '{op}' for target {target}")]
    UnknownOp { op: String, target: Target },

    #[error("op '{op}': dtype_format row {row} has {found} entries, expected {expected}")]
    RowArity { op: String, row: usize, expected: usize, found: usize },

    #[error("op '{op}': {kind} port index {index} declared twice")]
    DuplicatePort { op: String, kind: &'static str, index: usize },

    #[error("op '{op}': attribute '{attr}' declared twice")]
    DuplicateAttr { op: String, attr: String },

    #[error("op '{op}': attribute '{attr}': {reason}")]
    InvalidAttr { op: String, attr: String, reason: String },

    #[error("invalid descriptor json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scalar_and_list_values() {
        assert_eq!(AttrValue::parse(AttrType::Int, "0").unwrap(), AttrValue::Int(0));
        assert_eq!(AttrValue::parse(AttrType::Bool, "False").unwrap(), AttrValue::Bool(false));
        assert_eq!(AttrValue::parse(AttrType::Float, "0.5").unwrap(), AttrValue::Float(0.5));
        assert_eq!(
            AttrValue::parse(AttrType::ListInt, "1, 2,3").unwrap(),
            AttrValue::ListInt(vec![1, 2, 3]),
        );
        assert_eq!(AttrValue::parse(AttrType::ListStr, "").unwrap(), AttrValue::ListStr(vec![]));
        assert!(AttrValue::parse(AttrType::Int, "zero").is_err());
        assert!(AttrValue::parse(AttrType::Bool, "1").is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let v = AttrValue::ListFloat(vec![1.0, 2.5]);
        assert_eq!(v.to_string(), "1,2.5");
        assert_eq!(AttrValue::parse(AttrType::ListFloat, &v.to_string()).unwrap(), v);
    }

    #[test]
    fn default_must_be_allowed_and_typed() {
        let ok = AttrDef::parse("exclusive", ParamType::Optional, AttrType::Bool, "true,false", Some("false"))
            .unwrap();
        assert_eq!(ok.default, Some(AttrValue::Bool(false)));
        assert_eq!(ok.allowed, AllowedValues::Set(vec![true.into(), false.into()]));

        let bad_type = AttrDef::parse("axis", ParamType::Optional, AttrType::Int, "all", Some("x"));
        assert!(bad_type.is_err());

        let not_allowed = AttrDef::parse("mode", ParamType::Optional, AttrType::Int, "1,2", Some("3"));
        assert!(not_allowed.unwrap_err().contains("not one of '1,2'"));

        let list_set = AttrDef::parse("perm", ParamType::Optional, AttrType::ListInt, "1,2", None);
        assert!(list_set.is_err());
    }

    #[test]
    fn check_rejects_wrong_type_and_value() {
        let def = AttrDef::parse("reverse", ParamType::Optional, AttrType::Bool, "true,false", Some("false"))
            .unwrap();
        assert!(def.check(&AttrValue::Bool(true)).is_ok());
        assert!(def.check(&AttrValue::Int(1)).is_err());
    }

    #[test]
    fn attr_record_uses_registration_strings() {
        let def = AttrDef::parse("axis", ParamType::Optional, AttrType::Int, "all", Some("0")).unwrap();
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "axis",
                "param_type": "optional",
                "type": "int",
                "value": "all",
                "default_value": "0",
            }),
        );
        let back: AttrDef = serde_json::from_value(json).unwrap();
        assert_eq!(back, def);

        let bad = serde_json::json!({
            "name": "axis", "param_type": "optional", "type": "bool", "value": "all", "default_value": "7",
        });
        assert!(serde_json::from_value::<AttrDef>(bad).is_err());
    }

    #[test]
    fn incomplete_message_lists_fields() {
        let err = OpError::IncompleteDescriptor { op: "CumSum".into(), missing: vec!["output", "dtype_format"] };
        assert_eq!(err.to_string(), "op 'CumSum' is missing required field(s): output, dtype_format");
    }
}
