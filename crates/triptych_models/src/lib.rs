//! Generation capability backends for Triptych.
//!
//! Each provider lives behind its own feature flag. The only provider today is
//! **Gemini** (Google), enabled by the default `gemini` feature, which talks to
//! the REST `generateContent` endpoint directly.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "gemini")]
//! # {
//! use triptych_core::ApiConfiguration;
//! use triptych_interface::GenerationCapability;
//! use triptych_models::{GeminiGenerator, GeminiSettings};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = GeminiGenerator::from_env(GeminiSettings::default())?;
//! let config = ApiConfiguration::builder()
//!     .variation_name("fast")
//!     .model_name("gemini-2.0-flash")
//!     .temperature(0.2)
//!     .build()?;
//! let output = generator.generate(&config, "Say hello").await?;
//! println!("{}", output.text);
//! # Ok(())
//! # }
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{
    DEFAULT_GEMINI_BASE_URL, GeminiGenerator, GeminiSettings, GeminiSettingsBuilder,
};
