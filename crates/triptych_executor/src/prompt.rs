//! Outbound prompt composition.

/// Join system prompt, base prompt and context, in that order.
///
/// Absent or blank parts are omitted along with their separators.
///
/// # Examples
///
/// ```
/// use triptych_executor::compose_prompt;
///
/// assert_eq!(
///     compose_prompt(Some("Be brief."), "Say hello", Some("User is French")),
///     "System: Be brief.\n\nSay hello\n\nContext: User is French"
/// );
/// assert_eq!(compose_prompt(None, "Say hello", None), "Say hello");
/// ```
pub fn compose_prompt(system: Option<&str>, prompt: &str, context: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(3);
    if let Some(system) = system.filter(|s| !s.trim().is_empty()) {
        parts.push(format!("System: {}", system));
    }
    parts.push(prompt.to_string());
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        parts.push(format!("Context: {}", context));
    }
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_parts_are_omitted() {
        assert_eq!(compose_prompt(Some("  "), "p", Some("")), "p");
        assert_eq!(compose_prompt(None, "p", Some("c")), "p\n\nContext: c");
    }
}
