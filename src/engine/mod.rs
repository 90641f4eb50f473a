pub mod alert_log;
pub mod queue;
pub mod registry;

pub use alert_log::{AlertLog, DEFAULT_ALERT_CAPACITY};
pub use queue::PriorityQueue;
pub use registry::{AgentRegistry, LifecycleReport, RegistryEvent};
