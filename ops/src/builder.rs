use core_types::{DtypeFormat, Target};

use crate::op::OpInfo;
use crate::types::{AttrDef, AttrType, FusionType, IoDef, OpError, ParamType, ShapeSupport};

/// Default scheduling cost when `compute_cost` is never called
pub const DEFAULT_COMPUTE_COST: u32 = 10;

/// Step-wise builder for an [`OpInfo`].
///
/// Every call sets one field or appends one entry; the order is free.
/// `materialize` consumes the builder, so nothing can be configured once the
/// descriptor exists:
///
/// ```compile_fail
/// use oplib_ops::{FusionType, OpInfoBuilder, Target};
///
/// let builder = OpInfoBuilder::new("Noop", Target::Tbe);
/// let info = builder.materialize();
/// let builder = builder.fusion_type(FusionType::Opaque);
/// ```
#[derive(Debug)]
pub struct OpInfoBuilder {
    name:          String,
    target:        Target,
    fusion_type:   Option<FusionType>,
    async_flag:    bool,
    binfile_name:  Option<String>,
    kernel_name:   Option<String>,
    compute_cost:  u32,
    partial_flag:  bool,
    dynamic_shape: bool,
    attrs:         Vec<AttrDef>,
    inputs:        Vec<IoDef>,
    outputs:       Vec<IoDef>,
    dtype_formats: Vec<Vec<DtypeFormat>>,
    // first bad `attr` call, reported by `materialize`
    pending:       Option<OpError>,
}

impl OpInfoBuilder {
    pub fn new(name: &str, target: Target) -> Self {
        Self {
            name:          name.to_string(),
            target,
            fusion_type:   None,
            async_flag:    false,
            binfile_name:  None,
            kernel_name:   None,
            compute_cost:  DEFAULT_COMPUTE_COST,
            partial_flag:  false,
            dynamic_shape: false,
            attrs:         Vec::new(),
            inputs:        Vec::new(),
            outputs:       Vec::new(),
            dtype_formats: Vec::new(),
            pending:       None,
        }
    }

    pub fn fusion_type(mut self, fusion_type: FusionType) -> Self {
        self.fusion_type = Some(fusion_type);
        self
    }

    pub fn async_flag(mut self, flag: bool) -> Self {
        self.async_flag = flag;
        self
    }

    pub fn binfile_name(mut self, name: &str) -> Self {
        self.binfile_name = Some(name.to_string());
        self
    }

    pub fn kernel_name(mut self, name: &str) -> Self {
        self.kernel_name = Some(name.to_string());
        self
    }

    pub fn compute_cost(mut self, cost: u32) -> Self {
        self.compute_cost = cost;
        self
    }

    pub fn partial_flag(mut self, flag: bool) -> Self {
        self.partial_flag = flag;
        self
    }

    pub fn dynamic_shape(mut self, flag: bool) -> Self {
        self.dynamic_shape = flag;
        self
    }

    /// Append an attribute. `allowed` is `"all"` or a comma separated set;
    /// `default` uses the same spelling as the values.
    pub fn attr(
        mut self,
        name:       &str,
        param_type: ParamType,
        attr_type:  AttrType,
        allowed:    &str,
        default:    Option<&str>,
    ) -> Self {
        match AttrDef::parse(name, param_type, attr_type, allowed, default) {
            Ok(def) => self.attrs.push(def),
            Err(reason) => {
                if self.pending.is_none() {
                    self.pending = Some(OpError::InvalidAttr {
                        op: self.name.clone(),
                        attr: name.to_string(),
                        reason,
                    });
                }
            }
        }
        self
    }

    pub fn input(
        mut self,
        index:      usize,
        name:       &str,
        variadic:   bool,
        param_type: ParamType,
        shape:      ShapeSupport,
    ) -> Self {
        self.inputs.push(IoDef { index, name: name.to_string(), variadic, param_type, shape });
        self
    }

    pub fn output(
        mut self,
        index:      usize,
        name:       &str,
        variadic:   bool,
        param_type: ParamType,
        shape:      ShapeSupport,
    ) -> Self {
        self.outputs.push(IoDef { index, name: name.to_string(), variadic, param_type, shape });
        self
    }

    /// Append one supported row, one entry per port (inputs then outputs)
    pub fn dtype_format(mut self, row: &[DtypeFormat]) -> Self {
        self.dtype_formats.push(row.to_vec());
        self
    }

    /// Finish the descriptor.
    ///
    /// Fails with [`OpError::IncompleteDescriptor`] when `fusion_type`,
    /// `binfile_name`, `kernel_name`, `output` or `dtype_format` was never
    /// called, and with the structural errors of [`OpError`] otherwise.
    pub fn materialize(self) -> Result<OpInfo, OpError> {
        if let Some(err) = self.pending {
            return Err(err);
        }

        let mut missing = Vec::new();
        if self.fusion_type.is_none()   { missing.push("fusion_type"); }
        if self.binfile_name.is_none()  { missing.push("binfile_name"); }
        if self.kernel_name.is_none()   { missing.push("kernel_name"); }
        if self.outputs.is_empty()      { missing.push("output"); }
        if self.dtype_formats.is_empty() { missing.push("dtype_format"); }

        let (fusion_type, binfile_name, kernel_name) =
            match (self.fusion_type, self.binfile_name, self.kernel_name) {
                (Some(f), Some(b), Some(k)) if missing.is_empty() => (f, b, k),
                _ => return Err(OpError::IncompleteDescriptor { op: self.name, missing }),
            };

        let info = OpInfo {
            name:          self.name,
            target:        self.target,
            fusion_type,
            async_flag:    self.async_flag,
            binfile_name,
            kernel_name,
            compute_cost:  self.compute_cost,
            partial_flag:  self.partial_flag,
            dynamic_shape: self.dynamic_shape,
            attrs:         self.attrs,
            inputs:        self.inputs,
            outputs:       self.outputs,
            dtype_formats: self.dtype_formats,
        };
        info.check_structure()?;
        Ok(info)
    }
}
