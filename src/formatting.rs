//! Human-readable labels derived from identifiers and contact fields.

/// Label shown when no identifier is known
pub const GUEST_NAME: &str = "Guest User";

/// Derive a display name from a login identifier.
///
/// For email-like identifiers the local part is taken, '.' and '_' become
/// spaces and each segment is capitalised: `john.doe@x.com` -> `John Doe`.
/// Consecutive separators leave empty segments in place, so
/// `john..doe@x.com` keeps both spaces. Identifiers without '@' (phone
/// numbers) are returned unchanged; a missing or empty identifier yields
/// [`GUEST_NAME`].
pub fn format_display_name(identifier: Option<&str>) -> String {
    let identifier = match identifier {
        Some(id) if !id.is_empty() => id,
        _ => return GUEST_NAME.to_string(),
    };

    let Some(at) = identifier.find('@') else {
        return identifier.to_string();
    };

    identifier[..at]
        .replace(['.', '_'], " ")
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Truncate a string for fixed-width table output
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Render labelled values as `label: value` joined by commas, or `N/A`
pub fn format_labelled<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let rendered: Vec<String> = entries
        .into_iter()
        .map(|(label, value)| {
            if label.is_empty() {
                value.to_string()
            } else {
                format!("{}: {}", label, value)
            }
        })
        .collect();

    if rendered.is_empty() {
        "N/A".to_string()
    } else {
        rendered.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_display_name_email() {
        assert_eq!(format_display_name(Some("john.doe@x.com")), "John Doe");
        assert_eq!(format_display_name(Some("jane_smith@x.com")), "Jane Smith");
        assert_eq!(format_display_name(Some("alice@x.com")), "Alice");
    }

    #[test]
    fn test_format_display_name_keeps_empty_segments() {
        assert_eq!(format_display_name(Some("john..doe@x.com")), "John  Doe");
        assert_eq!(format_display_name(Some("john.@x.com")), "John ");
    }

    #[test]
    fn test_format_display_name_fallbacks() {
        assert_eq!(format_display_name(Some("")), "Guest User");
        assert_eq!(format_display_name(None), "Guest User");
        assert_eq!(format_display_name(Some("plainname")), "plainname");
        assert_eq!(format_display_name(Some("03001234567")), "03001234567");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer name", 10), "a much ...");
    }

    #[test]
    fn test_format_labelled() {
        assert_eq!(format_labelled(Vec::<(&str, &str)>::new()), "N/A");
        assert_eq!(
            format_labelled(vec![("Work", "a@b.com"), ("", "c@d.com")]),
            "Work: a@b.com, c@d.com"
        );
    }
}
