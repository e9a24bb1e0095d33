//! Run-scoped credentials.

use std::collections::HashMap;

/// Secrets available to one execution run.
///
/// Credentials travel with the request that starts a run rather than living in
/// process-wide state, so concurrent runs never see each other's keys. Values
/// are redacted from `Debug` output.
///
/// # Examples
///
/// ```
/// use triptych_core::Credentials;
///
/// let creds = Credentials::new().with("WEATHER_KEY", "secret");
/// assert_eq!(creds.get("WEATHER_KEY"), Some("secret"));
/// assert!(!format!("{:?}", creds).contains("secret"));
/// assert_eq!(creds.missing(&["WEATHER_KEY".into(), "MAPS_KEY".into()]), vec!["MAPS_KEY"]);
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    values: HashMap<String, String>,
}

impl Credentials {
    /// Empty credential set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace a credential.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a credential value. Empty values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Whether a non-empty credential exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names from `required` that are absent, in declaration order.
    pub fn missing<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .map(String::as_str)
            .filter(|name| !self.contains(name))
            .collect()
    }

    /// Collect the named credentials from environment variables of the same name.
    pub fn from_env<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref();
                std::env::var(name).ok().map(|v| (name.to_string(), v))
            })
            .collect()
    }

    /// Number of credentials held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no credentials are held.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut creds = Self::new();
        for (k, v) in iter {
            creds.insert(k, v);
        }
        creds
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Credentials")
            .field("names", &names)
            .finish_non_exhaustive()
    }
}
