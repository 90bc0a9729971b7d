//! Configured sensors and their trigger evaluation.

mod reading;
mod runtime;
mod spec;

pub use reading::Reading;
pub use runtime::{Observation, SensorRuntime};
pub use spec::{Predicate, SensorSpec, TriggerOperator};
