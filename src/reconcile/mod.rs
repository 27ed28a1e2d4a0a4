pub mod engine;
pub mod identity;
pub mod types;

pub use engine::reconcile;
pub use identity::IdentityPolicy;
pub use types::{
    Availability, ChangeEntry, ReconcileOptions, ReconcilePolicy, ReconciledEntry, SlotKey,
    SurveyResponse,
};
