pub mod assessment;
pub mod config;

pub use assessment::{AnalysisRequest, AnalysisStage, Assessment, ThreatLevel};
pub use config::{Config, ProviderConfig};
