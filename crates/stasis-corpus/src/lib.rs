//! Collaborator adapters for `stasis-core`: embedders, an in-memory
//! candidate supplier, corpus file loading and TOML configuration.

pub mod config;
pub mod embed;
pub mod error;
pub mod loader;
pub mod memory;

pub use config::{CONFIG_ENV, EmbeddingProvider, EmbeddingSettings, StasisConfig};
pub use embed::{Embedder, HashEmbedder, HttpEmbedder, cosine_similarity, create_embedder};
pub use error::{CorpusError, Result};
pub use loader::{ChunkRecord, load_file, load_files};
pub use memory::MemoryCorpus;
