// Input parsing and validation for command arguments and form values

use thiserror::Error;

/// Rejected user input, shown back to the user as-is
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Color must start with `#` or `0x`, e.g. `#00ff99`.")]
    ColorPrefix,
    #[error("`{0}` is not a valid hex color.")]
    ColorValue(String),
    #[error("{field} must be at most {max} characters.")]
    TooLong { field: &'static str, max: usize },
    #[error("`{0}` is not an emoji. Use one emoji like 🎫 or a custom one like `<:name:id>`.")]
    Emoji(String),
}

/// Parse `#rrggbb` / `0xrrggbb` into an RGB integer
///
/// A bare hex string without a prefix is rejected.
pub fn parse_embed_color(input: &str) -> Result<u32, InputError> {
    let input = input.trim();
    let hex = input
        .strip_prefix('#')
        .or_else(|| input.strip_prefix("0x"))
        .or_else(|| input.strip_prefix("0X"))
        .ok_or(InputError::ColorPrefix)?;

    if hex.is_empty() || hex.len() > 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(InputError::ColorValue(input.to_string()));
    }

    u32::from_str_radix(hex, 16).map_err(|_| InputError::ColorValue(input.to_string()))
}

/// Accept one Unicode emoji or a `<:name:id>` / `<a:name:id>` custom emoji
pub fn parse_button_emoji(input: &str) -> Result<(), InputError> {
    let input = input.trim();
    let valid = if input.starts_with('<') {
        is_custom_emoji(input)
    } else {
        is_unicode_emoji(input)
    };
    if valid {
        Ok(())
    } else {
        Err(InputError::Emoji(input.to_string()))
    }
}

fn is_custom_emoji(input: &str) -> bool {
    let Some(inner) = input.strip_prefix('<').and_then(|s| s.strip_suffix('>')) else {
        return false;
    };
    let inner = inner.strip_prefix('a').unwrap_or(inner);
    let mut parts = inner.split(':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(""), Some(name), Some(id), None) => {
            (2..=32).contains(&name.chars().count())
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !id.is_empty()
                && id.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

fn is_pictographic(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF
            | 0x2600..=0x27BF
            | 0x2300..=0x23FF
            | 0x2B00..=0x2BFF
            | 0x2190..=0x21FF
            | 0x25A0..=0x25FF
            | 0x2934..=0x2935
            | 0x3030
            | 0x303D
            | 0x3297
            | 0x3299
            | 0x00A9
            | 0x00AE
            | 0x203C
            | 0x2049
            | 0x2122
            | 0x2139
            | 0x24C2
    )
}

/// Joiners, variation selectors, keycap and tag marks inside one emoji
fn is_emoji_modifier(c: char) -> bool {
    matches!(c as u32, 0x200D | 0xFE0E | 0xFE0F | 0x20E3 | 0xE0020..=0xE007F)
}

/// One emoji, possibly a ZWJ / flag / keycap sequence
fn is_unicode_emoji(input: &str) -> bool {
    let chars: Vec<char> = input.chars().collect();
    let Some(&first) = chars.first() else {
        return false;
    };
    if chars.len() > 16 {
        return false;
    }

    // keycaps: 1️⃣ #️⃣ *️⃣
    if first.is_ascii_digit() || first == '#' || first == '*' {
        return chars[1..] == ['\u{FE0F}', '\u{20E3}'] || chars[1..] == ['\u{20E3}'];
    }

    is_pictographic(first)
        && chars[1..]
            .iter()
            .all(|&c| is_pictographic(c) || is_emoji_modifier(c))
}

/// Extract the id from a `<@&id>` role mention
pub fn parse_role_mention(input: &str) -> Option<u64> {
    input
        .trim()
        .strip_prefix("<@&")?
        .strip_suffix('>')?
        .parse()
        .ok()
}

/// Reject values over Discord's length limit for a field
pub fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), InputError> {
    if value.chars().count() > max {
        Err(InputError::TooLong { field, max })
    } else {
        Ok(())
    }
}

/// "billing" -> "Billing"
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_requires_prefix() {
        assert_eq!(parse_embed_color("00ff99"), Err(InputError::ColorPrefix));
    }

    #[test]
    fn test_color_prefixes_agree() {
        assert_eq!(parse_embed_color("#00ff99"), Ok(0x00ff99));
        assert_eq!(parse_embed_color("0x00ff99"), Ok(0x00ff99));
        assert_eq!(parse_embed_color(" 0X00FF99 "), Ok(0x00ff99));
    }

    #[test]
    fn test_color_rejects_garbage() {
        assert!(matches!(parse_embed_color("#"), Err(InputError::ColorValue(_))));
        assert!(matches!(parse_embed_color("#zzzzzz"), Err(InputError::ColorValue(_))));
        assert!(matches!(parse_embed_color("#1234567"), Err(InputError::ColorValue(_))));
        assert!(matches!(parse_embed_color("0x+12"), Err(InputError::ColorValue(_))));
    }

    #[test]
    fn test_button_emoji_accepts_emoji() {
        for ok in ["🎫", " 📩 ", "✉️", "👍🏽", "🧑‍💻", "🇫🇷", "1️⃣", "<:ticket:123456>", "<a:spin_2:99>"] {
            assert_eq!(parse_button_emoji(ok), Ok(()), "{} should be accepted", ok);
        }
    }

    #[test]
    fn test_button_emoji_rejects_text() {
        for bad in ["not an emoji", "", "ab", "🎫 open", "1", "<:x:123>", "<:ticket:abc>", "<ticket:1>", "<:ticket:1:2>"] {
            assert!(
                matches!(parse_button_emoji(bad), Err(InputError::Emoji(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_role_mention() {
        assert_eq!(parse_role_mention("<@&1234>"), Some(1234));
        assert_eq!(parse_role_mention("<@1234>"), None);
        assert_eq!(parse_role_mention("<@&abc>"), None);
        assert_eq!(parse_role_mention("Support"), None);
    }

    #[test]
    fn test_check_length_counts_chars() {
        assert!(check_length("Label", "🎫🎫", 2).is_ok());
        assert_eq!(
            check_length("Label", "abc", 2),
            Err(InputError::TooLong { field: "Label", max: 2 })
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("billing"), "Billing");
        assert_eq!(capitalize(""), "");
    }
}
