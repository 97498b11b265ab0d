/// Converts `UpperCamelCase` to `lower-hyphen-case`.
///
/// A hyphen is inserted before every uppercase letter except the first, so
/// acronyms are split per letter: `"HTTPCheck"` becomes `"h-t-t-p-check"`.
#[must_use]
pub fn upper_camel_to_lower_hyphen(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn converts_simple_names() {
        assert_eq!(upper_camel_to_lower_hyphen("Hello"), "hello");
        assert_eq!(upper_camel_to_lower_hyphen("HelloPath"), "hello-path");
        assert_eq!(
            upper_camel_to_lower_hyphen("HelloResourceTypePost"),
            "hello-resource-type-post"
        );
        assert_eq!(upper_camel_to_lower_hyphen("CheckAuthentication"), "check-authentication");
    }

    #[test]
    fn splits_acronyms_per_letter() {
        assert_eq!(upper_camel_to_lower_hyphen("HTTPCheck"), "h-t-t-p-check");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(upper_camel_to_lower_hyphen(""), "");
    }

    proptest! {
        #[test]
        fn output_has_no_uppercase(name in "[A-Z][a-zA-Z0-9]{0,24}") {
            let converted = upper_camel_to_lower_hyphen(&name);
            prop_assert!(!converted.chars().any(char::is_uppercase));
            prop_assert!(!converted.starts_with('-'));
        }

        #[test]
        fn hyphen_count_matches_inner_capitals(name in "[A-Z][a-z0-9]{0,8}([A-Z][a-z0-9]{0,8}){0,4}") {
            let inner_capitals = name.chars().skip(1).filter(char::is_ascii_uppercase).count();
            let converted = upper_camel_to_lower_hyphen(&name);
            prop_assert_eq!(converted.matches('-').count(), inner_capitals);
        }
    }
}
