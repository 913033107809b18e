pub mod builder;
pub mod builtin;
pub mod config;
pub mod op;
pub mod types;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

pub use builder::OpInfoBuilder;
pub use config::Config;
pub use core_types::{DataType, DtypeFormat, Format, Target};
pub use op::{OpInfo, RegisterOp};
pub use types::{
    AllowedValues, AttrDef, AttrType, AttrValue, FusionType, IoDef, OpError, ParamType, ShapeSupport,
};


/// Holds every registered descriptor, keyed by (target, op name).
///
/// Inserts are serialized behind a lock, so of two racing registrations of
/// the same key exactly one wins. Entries are never removed or replaced.
#[derive(Debug, Default)]
pub struct OpRegistry {
    map: RwLock<HashMap<Target, HashMap<String, Arc<OpInfo>>>>,
}

impl OpRegistry {
    pub fn new() -> Self {
        Self { map: RwLock::new(HashMap::new()) }
    }

    /// Insert a finished descriptor; the key is taken from the descriptor itself
    pub fn register(&self, info: OpInfo) -> Result<Arc<OpInfo>, OpError> {
        let target = info.target();
        let mut map = self.map.write();
        match map.entry(target).or_default().entry(info.name().to_string()) {
            Entry::Occupied(e) => {
                warn!(op = %e.key(), backend = %target, "duplicate operator registration");
                Err(OpError::DuplicateRegistration { op: e.key().clone(), target })
            }
            Entry::Vacant(e) => {
                debug!(
                    op = %e.key(),
                    backend = %target,
                    kernel = info.kernel_name(),
                    rows = info.dtype_formats().len(),
                    "registered operator"
                );
                Ok(e.insert(Arc::new(info)).clone())
            }
        }
    }

    /// Build and insert the descriptor of a builtin op
    pub fn register_op<O: RegisterOp>(&self) -> Result<Arc<OpInfo>, OpError> {
        let info = O::op_info()?;
        debug_assert_eq!(info.name(), O::NAME, "op_info() name disagrees with RegisterOp::NAME");
        debug_assert_eq!(info.target(), O::TARGET, "op_info() target disagrees with RegisterOp::TARGET");
        self.register(info)
    }

    /// Register a descriptor from its JSON record
    pub fn register_json(&self, json: &str) -> Result<Arc<OpInfo>, OpError> {
        self.register(OpInfo::from_json(json)?)
    }

    /// lookup
    pub fn get(&self, name: &str, target: Target) -> Option<Arc<OpInfo>> {
        self.map.read().get(&target)?.get(name).cloned()
    }

    /// Like `get`, but a miss is an error
    pub fn find(&self, name: &str, target: Target) -> Result<Arc<OpInfo>, OpError> {
        self.get(name, target)
            .ok_or_else(|| OpError::UnknownOp { op: name.to_string(), target })
    }

    pub fn contains(&self, name: &str, target: Target) -> bool {
        self.map.read().get(&target).is_some_and(|ops| ops.contains_key(name))
    }

    /// Number of descriptors across all targets
    pub fn len(&self) -> usize {
        self.map.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered op names for `target`, sorted
    pub fn names(&self, target: Target) -> Vec<String> {
        let mut names: Vec<String> = self
            .map
            .read()
            .get(&target)
            .map(|ops| ops.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::CumSum;
    use std::thread;

    fn elementwise(name: &str, target: Target) -> OpInfo {
        OpInfoBuilder::new(name, target)
            .fusion_type(FusionType::ElemWise)
            .binfile_name("add.so")
            .kernel_name("add")
            .input(0, "x1", false, ParamType::Required, ShapeSupport::All)
            .input(1, "x2", false, ParamType::Required, ShapeSupport::All)
            .output(0, "y", false, ParamType::Required, ShapeSupport::All)
            .dtype_format(&[DtypeFormat::F16_DEFAULT; 3])
            .materialize()
            .unwrap()
    }

    #[test]
    fn registry_and_cumsum() {
        let reg = OpRegistry::new();
        builtin::register_all(&reg).unwrap();

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.names(Target::Tbe), vec!["CumSum".to_string()]);
        assert!(reg.contains("CumSum", Target::Tbe));
        assert!(!reg.contains("CumSum", Target::Gpu));

        let info = reg.find("CumSum", Target::Tbe).unwrap();
        assert_eq!(info.kernel_name(), "cumsum");

        // requesting unknown op errors
        let err = reg.find("extremely_strange_op", Target::Tbe).unwrap_err();
        match err {
            OpError::UnknownOp { op, target } => {
                assert_eq!(op, "extremely_strange_op");
                assert_eq!(target, Target::Tbe);
            }
            other => panic!("expected UnknownOp, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let reg = OpRegistry::new();
        let first = reg.register_op::<CumSum>().unwrap();

        let err = reg.register_op::<CumSum>().unwrap_err();
        assert!(matches!(
            err,
            OpError::DuplicateRegistration { ref op, target: Target::Tbe } if op == "CumSum"
        ));

        // the original entry is untouched
        let kept = reg.get("CumSum", Target::Tbe).unwrap();
        assert!(Arc::ptr_eq(&first, &kept));
    }

    #[test]
    fn same_name_on_another_target_is_distinct() {
        let reg = OpRegistry::new();
        reg.register(elementwise("Add", Target::Tbe)).unwrap();
        reg.register(elementwise("Add", Target::AiCpu)).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("Add", Target::AiCpu).unwrap().target(), Target::AiCpu);
    }

    #[test]
    fn names_are_sorted_per_target() {
        let reg = OpRegistry::new();
        for name in ["Sub", "Add", "Mul"] {
            reg.register(elementwise(name, Target::Tbe)).unwrap();
        }
        reg.register_op::<CumSum>().unwrap();
        reg.register(elementwise("Div", Target::Gpu)).unwrap();

        assert_eq!(reg.names(Target::Tbe), ["Add", "CumSum", "Mul", "Sub"]);
        assert_eq!(reg.names(Target::Gpu), ["Div"]);
        assert!(reg.names(Target::Akg).is_empty());
    }

    struct Mislabelled;

    impl RegisterOp for Mislabelled {
        const NAME: &'static str = "Mul";
        const TARGET: Target = Target::Tbe;

        fn op_info() -> Result<OpInfo, OpError> {
            Ok(elementwise("Add", Target::Tbe))
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "disagrees with RegisterOp::NAME")]
    fn register_op_checks_declared_name() {
        let reg = OpRegistry::new();
        let _ = reg.register_op::<Mislabelled>();
    }

    #[test]
    fn racing_duplicates_have_one_winner() {
        let reg = Arc::new(OpRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || reg.register_op::<CumSum>().is_ok())
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn register_from_json() {
        let json = CumSum::op_info().unwrap().to_json().unwrap();
        let reg = OpRegistry::new();
        let info = reg.register_json(&json).unwrap();
        assert_eq!(*info, CumSum::op_info().unwrap());

        assert!(matches!(reg.register_json("{"), Err(OpError::Json(_))));
        assert!(matches!(reg.register_json(&json), Err(OpError::DuplicateRegistration { .. })));
    }

    #[test]
    fn reads_do_not_mutate() {
        let reg = OpRegistry::new();
        reg.register_op::<CumSum>().unwrap();
        let a = reg.get("CumSum", Target::Tbe).unwrap();
        let b = reg.get("CumSum", Target::Tbe).unwrap();
        assert_eq!(*a, *b);
        assert_eq!(a.dtype_formats(), b.dtype_formats());
    }
}
