pub mod prompt_builder;
pub mod response_parser;
pub mod retrieval;

pub use prompt_builder::build_prompt;
pub use response_parser::parse_response;
pub use retrieval::{build_or_load, ModuleIndex, RetrievalIndex};
