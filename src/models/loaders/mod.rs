pub mod corpus_loader;

pub use corpus_loader::{load_reference_corpus, parse_reference_corpus};
