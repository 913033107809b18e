use core_types::{DtypeFormat, Target};

use crate::builder::OpInfoBuilder;
use crate::op::{OpInfo, RegisterOp};
use crate::types::{AttrType, FusionType, OpError, ParamType, ShapeSupport};

const I32: DtypeFormat = DtypeFormat::I32_DEFAULT;
const I64: DtypeFormat = DtypeFormat::I64_DEFAULT;
const F16: DtypeFormat = DtypeFormat::F16_DEFAULT;
const F32: DtypeFormat = DtypeFormat::F32_DEFAULT;

/// “CumSum” (x, axis) → y, dynamic-shape TBE kernel
pub struct CumSum;

impl RegisterOp for CumSum {
    const NAME: &'static str = "CumSum";
    const TARGET: Target = Target::Tbe;

    fn op_info() -> Result<OpInfo, OpError> {
        OpInfoBuilder::new(Self::NAME, Self::TARGET)
            .fusion_type(FusionType::Opaque)
            .async_flag(false)
            .binfile_name("cumsum.so")
            .compute_cost(10)
            .kernel_name("cumsum")
            .partial_flag(true)
            .dynamic_shape(true)
            .attr("axis",      ParamType::Optional, AttrType::Int,  "all",        Some("0"))
            .attr("exclusive", ParamType::Optional, AttrType::Bool, "true,false", Some("false"))
            .attr("reverse",   ParamType::Optional, AttrType::Bool, "true,false", Some("false"))
            .input(0, "x",    false, ParamType::Required, ShapeSupport::All)
            .input(1, "axis", false, ParamType::Required, ShapeSupport::All)
            .output(0, "y",   false, ParamType::Required, ShapeSupport::All)
            .dtype_format(&[I32, I32, I32])
            .dtype_format(&[F32, I32, F32])
            .dtype_format(&[F16, I32, F16])
            .dtype_format(&[I32, I64, I32])
            .dtype_format(&[F32, I64, F32])
            .dtype_format(&[F16, I64, F16])
            .materialize()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttrValue;
    use core_types::DataType;

    #[test]
    fn descriptor_fields() {
        let info = CumSum::op_info().unwrap();
        assert_eq!(info.name(), "CumSum");
        assert_eq!(info.target(), Target::Tbe);
        assert_eq!(info.fusion_type(), FusionType::Opaque);
        assert!(!info.async_flag());
        assert_eq!(info.binfile_name(), "cumsum.so");
        assert_eq!(info.kernel_name(), "cumsum");
        assert_eq!(info.compute_cost(), 10);
        assert!(info.partial_flag());
        assert!(info.dynamic_shape());
    }

    #[test]
    fn every_row_covers_every_port() {
        let info = CumSum::op_info().unwrap();
        assert_eq!(info.num_ports(), 3);
        assert_eq!(info.dtype_formats().len(), 6);
        for row in info.dtype_formats() {
            assert_eq!(row.len(), info.num_ports());
        }
    }

    #[test]
    fn attribute_defaults_match_declared_types() {
        let info = CumSum::op_info().unwrap();
        let names: Vec<&str> = info.attrs().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["axis", "exclusive", "reverse"]);
        for a in info.attrs() {
            let d = a.default.as_ref().expect("every CumSum attr has a default");
            assert_eq!(d.attr_type(), a.attr_type);
        }
        assert_eq!(info.attr("exclusive").unwrap().default, Some(AttrValue::Bool(false)));
        assert_eq!(info.attr("axis").unwrap().default, Some(AttrValue::Int(0)));
    }

    #[test]
    fn port_dtypes() {
        let info = CumSum::op_info().unwrap();
        assert_eq!(info.supported_dtypes(0), vec![DataType::I32, DataType::F32, DataType::F16]);
        assert_eq!(info.supported_dtypes(1), vec![DataType::I32, DataType::I64]);
        assert_eq!(info.match_row(&[F16, I64, F16]), Some(5));
        assert_eq!(info.match_row(&[F32, I32, F16]), None);
    }
}
