//! Message-only errors for the outer surfaces: transport, encoding and settings.
//!
//! These carry a free-form message instead of a kind enum because their
//! callers only ever report them, never branch on them.

/// Declares a `{message, line, file}` error with a `#[track_caller]` constructor.
macro_rules! located_message_error {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            /// What went wrong
            pub message: String,
            /// Line where the error was created
            pub line: u32,
            /// File where the error was created
            pub file: &'static str,
        }

        impl $name {
            /// Create the error at the caller's location.
            #[track_caller]
            pub fn new(message: impl Into<String>) -> Self {
                let location = std::panic::Location::caller();
                Self {
                    message: message.into(),
                    line: location.line(),
                    file: location.file(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    concat!($label, ": {} at line {} in {}"),
                    self.message, self.line, self.file
                )
            }
        }

        impl std::error::Error for $name {}
    };
}

located_message_error!(
    /// A provider or function endpoint could not be reached, or the HTTP
    /// client could not be built.
    ///
    /// ```
    /// use triptych_error::HttpError;
    ///
    /// let err = HttpError::new("connection refused");
    /// assert!(err.to_string().starts_with("HTTP Error: connection refused"));
    /// ```
    HttpError,
    "HTTP Error"
);

located_message_error!(
    /// A request body or result payload could not be encoded or decoded.
    JsonError,
    "JSON Error"
);

located_message_error!(
    /// Layered settings, a plan file or the log filter were unreadable or invalid.
    ///
    /// ```
    /// use triptych_error::ConfigError;
    ///
    /// let err = ConfigError::new("generation_timeout_ms must be positive");
    /// assert!(err.to_string().contains("Configuration Error"));
    /// ```
    ConfigError,
    "Configuration Error"
);
