//! Values exchanged across the capability traits.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use triptych_core::{Credentials, FunctionCallRequest, ResolutionMode, UsageMetadata};

/// What a generation capability returns for one successful call.
///
/// # Examples
///
/// ```
/// use triptych_interface::GenerationOutput;
///
/// let output = GenerationOutput::builder()
///     .text("hi")
///     .latency_ms(10u64)
///     .build()
///     .unwrap();
/// assert!(output.function_calls.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct GenerationOutput {
    /// Generated text; empty when the provider only requested function calls
    #[builder(default)]
    pub text: String,
    /// Provider finish reason
    #[builder(default)]
    pub finish_reason: Option<String>,
    /// Token accounting
    #[builder(default)]
    pub usage: UsageMetadata,
    /// Function calls requested by the provider, in emission order
    #[builder(default)]
    pub function_calls: Vec<FunctionCallRequest>,
    /// Provider-side latency
    #[builder(default)]
    pub latency_ms: u64,
}

impl GenerationOutput {
    /// Creates a new output builder.
    pub fn builder() -> GenerationOutputBuilder {
        GenerationOutputBuilder::default()
    }

    /// Whether the provider asked for any function calls.
    pub fn has_function_calls(&self) -> bool {
        !self.function_calls.is_empty()
    }
}

/// One function call to resolve, with the session it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct FunctionInvocation<'a> {
    /// The call as emitted by the provider
    pub call: &'a FunctionCallRequest,
    /// Mode forced by the caller; `None` defers to the function's declared mode
    pub mode: Option<ResolutionMode>,
    /// Credentials of the owning run
    pub credentials: &'a Credentials,
}

impl<'a> FunctionInvocation<'a> {
    /// Invocation that honours the function's declared mode.
    pub fn new(call: &'a FunctionCallRequest, credentials: &'a Credentials) -> Self {
        Self {
            call,
            mode: None,
            credentials,
        }
    }

    /// Force a resolution mode.
    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = Some(mode);
        self
    }
}
