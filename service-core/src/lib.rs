//! service-core: shared HTTP infrastructure for the Kairnial façade services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
