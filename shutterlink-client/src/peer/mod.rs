mod orchestrator;
mod session;

pub use orchestrator::{Orchestrator, OrchestratorCommand};
pub use session::{NegotiationRole, NegotiationState};
