pub mod document;
pub mod grading;
pub mod loaders;
pub mod module;
pub mod prompt_template;

pub use document::{CorpusRecord, DocumentMetadata, ReferenceDocument};
pub use grading::{GradedSubmission, GradingRequest, GradingResult, Submission, MAX_SCORE};
pub use loaders::load_reference_corpus;
pub use module::GradingModule;
pub use prompt_template::PromptTemplate;
