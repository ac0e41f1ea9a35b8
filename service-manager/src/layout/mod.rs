pub mod classifier;
pub mod model;
pub mod scheduler;

pub use model::{ConnectorView, Topology};
pub use scheduler::{
    schedule, AlwaysAvailable, AvailabilityPredicate, FailedCheck, PortAvailability, Schedule,
    ScheduleDirection,
};
