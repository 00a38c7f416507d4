pub mod completion;
pub mod music;
pub mod narrative;

pub use completion::{CompletionClient, NarrativeError, OpenAiClient, OpenAiSettings};
pub use music::MusicCatalog;
pub use narrative::NarrativeGenerator;
