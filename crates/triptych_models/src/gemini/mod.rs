//! Google Gemini REST backend.
//!
//! [`GeminiGenerator`] sends one `generateContent` request per call, mapping
//! the configuration's sampling parameters, safety settings and tool config
//! onto the request and reading text, function calls, finish reason and
//! usage metadata back from the first candidate.

mod dto;
mod generator;
mod settings;

pub use generator::GeminiGenerator;
pub use settings::{DEFAULT_GEMINI_BASE_URL, GeminiSettings, GeminiSettingsBuilder};
