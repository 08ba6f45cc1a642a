// Formatting utilities for embeds and replies

/// Role mention, e.g. `<@&123>`
pub fn role_mention(id: impl std::fmt::Display) -> String {
    format!("<@&{}>", id)
}

/// Channel mention, e.g. `<#123>`
pub fn channel_mention(id: impl std::fmt::Display) -> String {
    format!("<#{}>", id)
}

/// User mention, e.g. `<@123>`
pub fn user_mention(id: impl std::fmt::Display) -> String {
    format!("<@{}>", id)
}

/// Truncate string to max characters with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Comma separated list, or "None"
pub fn list_or_none<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "None".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions() {
        assert_eq!(role_mention(5), "<@&5>");
        assert_eq!(channel_mention(6), "<#6>");
        assert_eq!(user_mention(7), "<@7>");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("🎫🎫🎫🎫🎫", 4), "🎫...");
    }

    #[test]
    fn test_list_or_none() {
        assert_eq!(list_or_none(Vec::<String>::new()), "None");
        assert_eq!(list_or_none(["billing", "general"]), "billing, general");
    }
}
