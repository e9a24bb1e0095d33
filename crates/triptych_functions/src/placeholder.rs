//! `{{KEY_NAME}}` credential placeholders in header values.

use triptych_core::Credentials;

/// Replace every `{{NAME}}` whose name is a known credential with its value.
///
/// Unknown placeholders are left untouched.
///
/// # Examples
///
/// ```
/// use triptych_core::Credentials;
/// use triptych_functions::substitute_credentials;
///
/// let creds = Credentials::new().with("TOKEN", "abc");
/// assert_eq!(substitute_credentials("Bearer {{TOKEN}}", &creds), "Bearer abc");
/// assert_eq!(substitute_credentials("{{ OTHER }}", &creds), "{{ OTHER }}");
/// ```
pub fn substitute_credentials(template: &str, credentials: &Credentials) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        let name = rest[start + 2..start + 2 + len].trim();
        out.push_str(&rest[..start]);
        match credentials.get(name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + len + 2]),
        }
        rest = &rest[start + 2 + len + 2..];
    }
    out.push_str(rest);
    out
}
