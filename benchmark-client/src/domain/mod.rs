pub mod category;
pub mod submission;

pub use category::{BuildingCategory, UnknownCategory};
pub use submission::{FacilitySubmission, SubmissionDraft};
