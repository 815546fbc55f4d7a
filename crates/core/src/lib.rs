pub mod age;
pub mod catalog;
pub mod credential;
pub mod interaction;
pub mod lead;
pub mod outreach;
pub mod query;
pub mod scoring;
pub mod stage;
pub mod stats;
pub mod validate;

pub use catalog::Catalog;
pub use credential::{Credential, Operator};
pub use interaction::{FollowUp, InteractionEvent};
pub use lead::{Lead, LeadDraft, LeadPatch};
pub use stage::{normalize as normalize_stage, Stage};
pub use validate::ValidationError;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
