use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

include!(concat!(env!("OUT_DIR"), "/generated_data_types.rs"));

/// A canonical name that matches no known variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind:  &'static str,
    pub value: String,
}

impl ParseError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

/// Memory layout of one tensor port
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Format {
    #[serde(rename = "DefaultFormat")]
    Default,
    #[serde(rename = "NCHW")]
    Nchw,
    #[serde(rename = "NHWC")]
    Nhwc,
    #[serde(rename = "ND")]
    Nd,
    #[serde(rename = "NC1HWC0")]
    Nc1hwc0,
    #[serde(rename = "FRACTAL_Z")]
    FracZ,
    #[serde(rename = "FRACTAL_NZ")]
    FracNz,
    #[serde(rename = "C1HWNCoC0")]
    C1hwncoc0,
    #[serde(rename = "NDHWC")]
    Ndhwc,
    #[serde(rename = "NCDHW")]
    Ncdhw,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Default   => "DefaultFormat",
            Format::Nchw      => "NCHW",
            Format::Nhwc      => "NHWC",
            Format::Nd        => "ND",
            Format::Nc1hwc0   => "NC1HWC0",
            Format::FracZ     => "FRACTAL_Z",
            Format::FracNz    => "FRACTAL_NZ",
            Format::C1hwncoc0 => "C1HWNCoC0",
            Format::Ndhwc     => "NDHWC",
            Format::Ncdhw     => "NCDHW",
        }
    }
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DefaultFormat" => Ok(Format::Default),
            "NCHW"          => Ok(Format::Nchw),
            "NHWC"          => Ok(Format::Nhwc),
            "ND"            => Ok(Format::Nd),
            "NC1HWC0"       => Ok(Format::Nc1hwc0),
            "FRACTAL_Z"     => Ok(Format::FracZ),
            "FRACTAL_NZ"    => Ok(Format::FracNz),
            "C1HWNCoC0"     => Ok(Format::C1hwncoc0),
            "NDHWC"         => Ok(Format::Ndhwc),
            "NCDHW"         => Ok(Format::Ncdhw),
            other           => Err(ParseError::new("format", other)),
        }
    }
}

/// One port's (dtype, layout) entry in a supported row.
///
/// Serialized as a `[dtype, format]` pair, the way registration records
/// spell it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(DataType, Format)", into = "(DataType, Format)")]
pub struct DtypeFormat {
    pub dtype:  DataType,
    pub format: Format,
}

impl DtypeFormat {
    pub const fn new(dtype: DataType, format: Format) -> Self {
        Self { dtype, format }
    }

    pub const F16_5HD: DtypeFormat = DtypeFormat::new(DataType::F16, Format::Nc1hwc0);
    pub const F32_5HD: DtypeFormat = DtypeFormat::new(DataType::F32, Format::Nc1hwc0);
}

impl From<(DataType, Format)> for DtypeFormat {
    fn from((dtype, format): (DataType, Format)) -> Self {
        Self { dtype, format }
    }
}

impl From<DtypeFormat> for (DataType, Format) {
    fn from(df: DtypeFormat) -> Self {
        (df.dtype, df.format)
    }
}

/// Hardware backend a kernel is compiled for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Target {
    #[serde(rename = "TBE")]
    Tbe,
    #[serde(rename = "AiCPU")]
    AiCpu,
    #[serde(rename = "AKG")]
    Akg,
    #[serde(rename = "CPU")]
    Cpu,
    #[serde(rename = "GPU")]
    Gpu,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Tbe   => "TBE",
            Target::AiCpu => "AiCPU",
            Target::Akg   => "AKG",
            Target::Cpu   => "CPU",
            Target::Gpu   => "GPU",
        }
    }
}

impl FromStr for Target {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TBE"   => Ok(Target::Tbe),
            "AiCPU" => Ok(Target::AiCpu),
            "AKG"   => Ok(Target::Akg),
            "CPU"   => Ok(Target::Cpu),
            "GPU"   => Ok(Target::Gpu),
            other   => Err(ParseError::new("target", other)),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(DataType, Format, Target);

impl fmt::Display for DtypeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dtype, self.format)
    }
}
