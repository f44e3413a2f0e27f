//! Query text parsing.

/// Which grammar to apply. Only free-text queries exist today; the mode
/// parameter is the seam the surrounding system selects parsers through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    Query,
}

/// Append the tokens of `text` to `terms`: maximal alphanumeric runs,
/// lowercased.
pub fn parse_into(terms: &mut Vec<String>, text: &str, mode: ParseMode) {
    match mode {
        ParseMode::Query => {
            terms.extend(
                text.split(|c: char| !c.is_alphanumeric())
                    .filter(|token| !token.is_empty())
                    .map(str::to_lowercase),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizes_and_lowercases() {
        let mut terms = Vec::new();
        parse_into(&mut terms, "One two  THREE", ParseMode::Query);
        assert_eq!(terms, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_splits_on_punctuation() {
        let mut terms = Vec::new();
        parse_into(&mut terms, "foo-bar, baz's", ParseMode::Query);
        assert_eq!(terms, vec!["foo", "bar", "baz", "s"]);
    }

    #[test]
    fn test_appends_to_existing() {
        let mut terms = vec!["kept".to_string()];
        parse_into(&mut terms, "new", ParseMode::Query);
        assert_eq!(terms, vec!["kept", "new"]);
    }
}
