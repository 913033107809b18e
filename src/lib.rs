//! Kernel-info registry: operator descriptors and the registry the kernel
//! selector reads them from.
//!
//! ```
//! let registry = oplib::init(&oplib::Config::default()).unwrap();
//! let cum_sum = registry.find("CumSum", oplib::Target::Tbe).unwrap();
//! assert_eq!(cum_sum.dtype_formats().len(), 6);
//! ```

use anyhow::{Context, Result};
use tracing::{info, warn};

pub use core_types::{DataType, DtypeFormat, Format, ParseError, Target};
pub use oplib_ops::builtin;
pub use oplib_ops::{
    AllowedValues, AttrDef, AttrType, AttrValue, Config, FusionType, IoDef, OpError, OpInfo,
    OpInfoBuilder, OpRegistry, ParamType, RegisterOp, ShapeSupport,
};

/// Create the registry and register every builtin descriptor.
///
/// Any failure here means a descriptor is malformed or registered twice;
/// callers should abort start-up.
pub fn init(config: &Config) -> Result<OpRegistry> {
    let registry = OpRegistry::new();
    builtin::register_all(&registry).context("failed to register builtin operators")?;

    let local = registry.names(config.target).len();
    if local == 0 {
        warn!(backend = %config.target, "no operators registered for configured target");
    }
    info!(
        ops = registry.len(),
        local,
        backend = %config.target,
        kernel_dir = %config.kernel_dir.display(),
        "operator registry initialised"
    );
    Ok(registry)
}
