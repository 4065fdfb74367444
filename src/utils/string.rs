//! String and naming-convention helpers

use convert_case::{Case, Casing};

/// Slugify a name: lowercase it and join alphanumeric runs with `delim`.
///
/// `slugify("My App", "-")` is `"my-app"`; `slugify("my_app", "_")` is
/// `"my_app"`.
pub fn slugify(text: &str, delim: &str) -> String {
    text.to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(delim)
}

/// Convert `snake_case` to `PascalCase`.
pub fn under2camel(text: &str) -> String {
    text.to_case(Case::Pascal)
}

/// Convert `PascalCase`/`camelCase` to `snake_case`.
pub fn camel2under(text: &str) -> String {
    text.to_case(Case::Snake)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("my_app", "-"), "my-app");
        assert_eq!(slugify("my_app", "_"), "my_app");
        assert_eq!(slugify("My App!", "-"), "my-app");
        assert_eq!(slugify("a--b__c", "-"), "a-b-c");
        assert_eq!(slugify("", "-"), "");
    }

    #[test]
    fn test_under2camel() {
        assert_eq!(under2camel("hello_world"), "HelloWorld");
        assert_eq!(under2camel("my_app"), "MyApp");
    }

    #[test]
    fn test_camel2under() {
        assert_eq!(camel2under("HelloWorld"), "hello_world");
        assert_eq!(camel2under("myApp"), "my_app");
    }
}
