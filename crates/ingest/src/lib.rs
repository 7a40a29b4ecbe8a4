pub mod embedding;
pub mod events;

pub use embedding::{Embedder, EmbeddingError};
pub use events::{read_events, read_events_from};
