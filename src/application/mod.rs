//! Application Layer
//!
//! - `orchestrator`: the discovery and buy cycle
//! - `monitor`: one exit watcher per open position
//! - `registry`: the shared set of pairs with an open position
//! - `shutdown`: cooperative stop signal

pub mod monitor;
pub mod orchestrator;
pub mod registry;
pub mod shutdown;

pub use monitor::{MonitorSettings, PositionMonitor};
pub use orchestrator::{CycleReport, OrchestratorError, OrchestratorSettings, TradingOrchestrator};
pub use registry::{OpenPositions, PositionClaim};
