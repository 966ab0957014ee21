pub mod driver;
pub mod generator;
pub mod report;
pub mod workload;

pub use driver::Sim;
pub use generator::{GeneratorConfig, GeneratorError, WorkloadGenerator};
pub use report::{Detailed, Summary};
pub use workload::{BurstPair, ProcessSpec, WorkloadError, WorkloadSpec};
