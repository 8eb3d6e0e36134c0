// Domain layer: core models and ports (interfaces) of the dispatch simulation.

pub mod model;
pub mod ports;
