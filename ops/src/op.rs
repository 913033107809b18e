use std::collections::HashSet;
use std::path::PathBuf;

use core_types::{DataType, DtypeFormat, Target};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::types::{AttrDef, AttrValue, FusionType, IoDef, OpError, ParamType};


/// Immutable kernel-info record for one operator on one target.
///
/// Produced by [`OpInfoBuilder::materialize`](crate::OpInfoBuilder::materialize)
/// or [`OpInfo::from_json`]; there is no way to change it afterwards.
/// Ports are ordered inputs first, then outputs, and every row in
/// `dtype_formats` holds one entry per port in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpInfo {
    #[serde(rename = "op_name")]
    pub(crate) name:          String,
    #[serde(rename = "imply_type")]
    pub(crate) target:        Target,
    pub(crate) fusion_type:   FusionType,
    pub(crate) async_flag:    bool,
    pub(crate) binfile_name:  String,
    pub(crate) kernel_name:   String,
    pub(crate) compute_cost:  u32,
    pub(crate) partial_flag:  bool,
    pub(crate) dynamic_shape: bool,
    pub(crate) attrs:         Vec<AttrDef>,
    pub(crate) inputs:        Vec<IoDef>,
    pub(crate) outputs:       Vec<IoDef>,
    #[serde(rename = "dtype_format")]
    pub(crate) dtype_formats: Vec<Vec<DtypeFormat>>,
}

impl OpInfo {
    pub fn name(&self)          -> &str                { &self.name }
    pub fn target(&self)        -> Target              { self.target }
    pub fn fusion_type(&self)   -> FusionType          { self.fusion_type }
    pub fn async_flag(&self)    -> bool                { self.async_flag }
    pub fn binfile_name(&self)  -> &str                { &self.binfile_name }
    pub fn kernel_name(&self)   -> &str                { &self.kernel_name }
    pub fn compute_cost(&self)  -> u32                 { self.compute_cost }
    pub fn partial_flag(&self)  -> bool                { self.partial_flag }
    pub fn dynamic_shape(&self) -> bool                { self.dynamic_shape }
    pub fn attrs(&self)         -> &[AttrDef]          { &self.attrs }
    pub fn inputs(&self)        -> &[IoDef]            { &self.inputs }
    pub fn outputs(&self)       -> &[IoDef]            { &self.outputs }
    pub fn dtype_formats(&self) -> &[Vec<DtypeFormat>] { &self.dtype_formats }

    /// Total number of ports (inputs + outputs)
    pub fn num_ports(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    /// All ports, inputs first
    pub fn ports(&self) -> impl Iterator<Item = &IoDef> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    pub fn attr(&self, name: &str) -> Option<&AttrDef> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// Index of the first row matching `ports` exactly, if any
    pub fn match_row(&self, ports: &[DtypeFormat]) -> Option<usize> {
        self.dtype_formats.iter().position(|row| row.as_slice() == ports)
    }

    /// Distinct dtypes accepted by port `port` across all rows, first-seen order
    pub fn supported_dtypes(&self, port: usize) -> Vec<DataType> {
        let mut out = Vec::new();
        for row in &self.dtype_formats {
            if let Some(df) = row.get(port) {
                if !out.contains(&df.dtype) {
                    out.push(df.dtype);
                }
            }
        }
        out
    }

    /// Validate caller attribute values and fill in defaults.
    ///
    /// Output follows declaration order. Optional attributes with no value
    /// and no default are left out.
    pub fn resolve_attrs(&self, given: &[(&str, AttrValue)]) -> Result<Vec<(String, AttrValue)>, OpError> {
        let invalid = |attr: &str, reason: String| OpError::InvalidAttr {
            op: self.name.clone(),
            attr: attr.to_string(),
            reason,
        };

        if let Some((name, _)) = given.iter().find(|(n, _)| self.attr(n).is_none()) {
            return Err(invalid(name, "not declared by this op".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some((name, _)) = given.iter().find(|(n, _)| !seen.insert(*n)) {
            return Err(invalid(name, "supplied twice".to_string()));
        }

        let mut resolved = Vec::with_capacity(self.attrs.len());
        for def in &self.attrs {
            match given.iter().find(|(n, _)| *n == def.name) {
                Some((_, value)) => {
                    def.check(value).map_err(|reason| invalid(&def.name, reason))?;
                    resolved.push((def.name.clone(), value.clone()));
                }
                None => match (&def.default, def.param_type) {
                    (Some(d), _) => resolved.push((def.name.clone(), d.clone())),
                    (None, ParamType::Required) => {
                        return Err(invalid(&def.name, "required attribute not supplied".to_string()));
                    }
                    (None, _) => {}
                },
            }
        }
        Ok(resolved)
    }

    /// Where the kernel binary lives under the configured kernel directory
    pub fn binary_path(&self, config: &Config) -> PathBuf {
        config.kernel_dir.join(&self.binfile_name)
    }

    pub fn to_json(&self) -> Result<String, OpError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a descriptor from its JSON record, enforcing the same structure
    /// checks as the builder.
    pub fn from_json(json: &str) -> Result<Self, OpError> {
        let info: OpInfo = serde_json::from_str(json)?;
        info.check_structure()?;
        Ok(info)
    }

    /// Invariants shared by the builder and the JSON path
    pub(crate) fn check_structure(&self) -> Result<(), OpError> {
        let mut missing = Vec::new();
        if self.name.is_empty()         { missing.push("name"); }
        if self.binfile_name.is_empty() { missing.push("binfile_name"); }
        if self.kernel_name.is_empty()  { missing.push("kernel_name"); }
        if self.outputs.is_empty()      { missing.push("output"); }
        if self.dtype_formats.is_empty() { missing.push("dtype_format"); }
        if !missing.is_empty() {
            return Err(OpError::IncompleteDescriptor { op: self.name.clone(), missing });
        }

        for (kind, ports) in [("input", &self.inputs), ("output", &self.outputs)] {
            let mut seen = HashSet::new();
            for p in ports {
                if !seen.insert(p.index) {
                    return Err(OpError::DuplicatePort { op: self.name.clone(), kind, index: p.index });
                }
            }
        }

        let mut seen = HashSet::new();
        for a in &self.attrs {
            if !seen.insert(a.name.as_str()) {
                return Err(OpError::DuplicateAttr { op: self.name.clone(), attr: a.name.clone() });
            }
        }

        let expected = self.num_ports();
        for (row, entries) in self.dtype_formats.iter().enumerate() {
            if entries.len() != expected {
                return Err(OpError::RowArity {
                    op: self.name.clone(),
                    row,
                    expected,
                    found: entries.len(),
                });
            }
        }
        Ok(())
    }
}


/// Implemented by each builtin operator to describe its kernel
pub trait RegisterOp {
    /// Operator name in the graph IR
    const NAME: &'static str;
    /// Backend the descriptor targets
    const TARGET: Target;

    fn op_info() -> Result<OpInfo, OpError>;
}
