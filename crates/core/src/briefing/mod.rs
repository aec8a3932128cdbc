pub mod orchestrator;
pub mod report;
pub mod service;

pub use orchestrator::{BriefingEngine, EngineConfig};
pub use service::BriefingService;
