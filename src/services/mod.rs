pub mod extractor;
pub mod llm_scorer;
pub mod llm_service;
pub mod reconciler;
pub mod scoring;
pub mod warn_writer;

pub use extractor::{extract, extract_or_empty, SubmissionMap};
pub use llm_scorer::LlmScorer;
pub use llm_service::LlmService;
pub use reconciler::reconcile;
pub use scoring::{RubricScore, ScoringAdapter, ScoringRequest, FALLBACK_COMMENT};
pub use warn_writer::{GradingWarning, WarnWriter};
