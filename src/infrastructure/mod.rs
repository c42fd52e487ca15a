pub mod embedder;
pub mod index_store;

pub use embedder::{build_embedder, Embedder, HashingEmbedder, OllamaEmbedder};
pub use index_store::{IndexArtifact, IndexStore};
