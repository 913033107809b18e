//! Kernel descriptors shipped with the library.

pub mod cum_sum;

pub use cum_sum::CumSum;

use crate::types::OpError;
use crate::OpRegistry;

/// Register every builtin descriptor, in a fixed order
pub fn register_all(registry: &OpRegistry) -> Result<(), OpError> {
    registry.register_op::<CumSum>()?;
    Ok(())
}
