//! Live Gemini calls. Run with `--features api` and `GEMINI_API_KEY` set.

use triptych_core::ApiConfiguration;
use triptych_interface::GenerationCapability;
use triptych_models::{GeminiGenerator, GeminiSettings};

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_gemini_live_generation() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let generator = GeminiGenerator::from_env(GeminiSettings::default())?;

    let configuration = ApiConfiguration::builder()
        .variation_name("live")
        .model_name("gemini-2.0-flash")
        .temperature(0.0)
        .max_tokens(16u32)
        .build()?;

    let output = generator
        .generate(&configuration, "Say 'test' and nothing else.")
        .await?;

    assert!(!output.text.is_empty());
    println!("Response: {}", output.text);
    Ok(())
}
