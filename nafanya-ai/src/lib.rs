pub mod models;
pub mod provider;
pub mod router;

// Re-export public APIs
pub use models::{HarmCategory, HarmThreshold, ProviderConfig, SafetySetting};
pub use provider::{GeminiProvider, ImageProvider, OpenAiCompatibleProvider, TextProvider};
pub use router::{ProviderSlot, ResponseRouter};
