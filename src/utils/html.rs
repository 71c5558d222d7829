use crate::error::AppError;

/// Clean user-supplied text using the ammonia library.
///
/// Whitelist-based: safe inline tags (like <b>, <p>) survive, while dangerous
/// tags (like <script>, <iframe>) and event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitizes a post or comment field and checks the result against the
/// stored limits: non-blank and at most `max_chars` characters once cleaned.
///
/// Failures are reported against `field` with `message`, the same shape the
/// request DTO validation produces.
pub fn clean_text(
    field: &str,
    input: &str,
    max_chars: usize,
    message: &str,
) -> Result<String, AppError> {
    let cleaned = clean_html(input);
    if cleaned.trim().is_empty() || cleaned.chars().count() > max_chars {
        return Err(AppError::field(field, message));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = "Comment must be between 1 and 10 characters";

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(clean_html("see you at the fan meeting"), "see you at the fan meeting");
    }

    #[test]
    fn scripts_are_stripped() {
        assert_eq!(clean_html("hi<script>alert(1)</script>"), "hi");
    }

    #[test]
    fn markup_only_text_is_rejected() {
        let err = clean_text("content", "<script>alert(1)</script>", 10, MESSAGE).unwrap_err();
        match err {
            AppError::Validation { message, data } => {
                assert_eq!(message, MESSAGE);
                assert!(data.unwrap()["content"].is_array());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn limit_applies_to_escaped_text() {
        // "<" is stored as "&lt;", four characters each.
        assert!(clean_text("content", "<<<", 10, MESSAGE).is_err());
        assert_eq!(clean_text("content", "<<", 10, MESSAGE).unwrap(), "&lt;&lt;");
        assert_eq!(clean_text("content", "abcdefghij", 10, MESSAGE).unwrap(), "abcdefghij");
    }
}
