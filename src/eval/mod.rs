//! Batch scoring and session simulation
//!
//! Two ways to produce scoring results without a live candidate session:
//! 1. Batch scoring - score a directory of recorded session request files
//! 2. Simulation - play a scripted prompt sequence against a canned
//!    responder and score the resulting transcript

mod results;
mod runner;
mod session;

pub use results::{BatchResults, BatchSummary, OutcomeStatus, SessionOutcome};
pub use runner::BatchRunner;
pub use session::{SessionRunner, SessionScript};
