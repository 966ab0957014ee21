pub mod core;
pub mod scheduler;
pub mod sim;

pub use crate::core::{Engine, RunReport, Transition};
pub use scheduler::{Algorithm, Policy};
pub use sim::{Sim, WorkloadSpec};
