mod llm;
mod shared_store;
mod vector_store;

pub use llm::{ChatMessage, ChatParams, LanguageModel, Role};
pub use shared_store::{SharedStore, StoreMetadata};
pub use vector_store::VectorStoreClient;
