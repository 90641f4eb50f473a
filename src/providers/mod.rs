pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::{cosine_similarity, EmbeddingProvider, EmbeddingRequest, MockEmbeddingProvider};
pub use llm::{GenerationRequest, MockTextGenerator, TextGenerator};
pub use ollama::OllamaProvider;
