//! Service layer for the portal client.
//!
//! This module contains the business logic for:
//! - Login handshake (`Authenticator`, `FormPayloadBuilder`, `LoginOutcomeClassifier`)
//! - Session lifecycle (`SessionHandle`)
//! - Heuristic extraction (`HeuristicExtractor`) and candidate probing (`CandidateProber`)
//! - The `Portal` facade tying them together

pub mod auth;
pub mod classifier;
pub mod extractor;
pub mod harvester;
pub mod payload;
pub mod portal;
pub mod prober;
pub mod session;

pub use auth::{Authenticator, Handshake};
pub use classifier::{LoginOutcomeClassifier, LoginSignals};
pub use extractor::{HeuristicExtractor, Locator, parse_tables};
pub use harvester::{LoginPage, harvest_hidden_fields};
pub use payload::{FormPayloadBuilder, submit_url};
pub use portal::{DEFAULT_ANNOUNCEMENT_LIMIT, Portal};
pub use prober::CandidateProber;
pub use session::{Session, SessionHandle, SessionState};
