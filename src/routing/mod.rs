pub mod classifier;
pub mod orchestrator;

pub use classifier::{classify, Confidence, DomainSelection, RoutingDecision};
pub use orchestrator::{Orchestrator, QueryRequest, QueryResponse};
