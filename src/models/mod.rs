pub mod contract;
pub mod report;
pub mod verification;

pub use contract::{AnnotationMap, FunctionEntry, StructuralModel};
pub use report::{RunRecord, RunReport};
pub use verification::{
    Classification, FunctionStatus, IterationRecord, RunResult, VerificationOutcome,
};
