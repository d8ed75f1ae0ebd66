pub mod loaders;
pub mod prompts;
pub mod roster;
pub mod rubric;
pub mod submission;

pub use prompts::AssignmentPromptSet;
pub use roster::{Course, RosterEntry, Student};
pub use rubric::{ScoringScale, CRITERIA_COUNT, CRITERIA_NAMES};
pub use submission::{Resolution, Score, SubmissionRecord, NOT_SUBMITTED_MARKER};
