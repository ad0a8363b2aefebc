pub mod alert_type;
pub mod monitor;
pub mod rules;
pub mod scheduler;
pub mod status;

pub use monitor::{Monitor, MonitorSettings};
pub use scheduler::Scheduler;
