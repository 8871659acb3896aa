mod session;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::StudyServiceError;
pub use session::{SessionEngine, StudySession};
pub use workflow::{ActionReport, StudyLoopService};
