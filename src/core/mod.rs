pub mod allocator;
pub mod cache;
pub mod locations;
pub mod processor;
pub mod ranker;
pub mod refresher;
pub mod simulation;

pub use crate::domain::model::{
    AllocationResult, CallOutcome, CallStatus, DispatchOrder, EmergencyCall, Location,
    RunSummary, ServiceRequest, ServiceType,
};
pub use crate::domain::ports::{
    AvailabilitySource, ConfigProvider, DispatchGateway, IncidentSource, LocationDirectory,
    SimulationControl,
};
pub use crate::utils::error::Result;
