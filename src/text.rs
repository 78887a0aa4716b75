use crate::error::NavigationError;
use std::collections::HashMap;

/// A piece of display text, either plain or translated per language
#[derive(Clone, Debug, PartialEq)]
pub enum Text {
    /// The same text for every language
    Plain(String),
    /// A map from language tag to text
    Localized(HashMap<String, String>),
}

impl Text {
    /// Creates a plain text
    pub fn plain<S: Into<String>>(value: S) -> Self {
        Text::Plain(value.into())
    }

    /// Creates a localized text from `(language, text)` pairs
    pub fn localized<K, V, I>(translations: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Text::Localized(
            translations
                .into_iter()
                .map(|(lang, value)| (lang.into(), value.into()))
                .collect(),
        )
    }

    /// Resolves the text for a language
    ///
    /// Plain text passes through untouched; localized text requires a
    /// language and a matching entry.
    pub(crate) fn resolve(&self, lang: Option<&str>) -> Result<&str, NavigationError> {
        match (self, lang) {
            (Text::Plain(value), _) => Ok(value),
            (Text::Localized(translations), Some(lang)) => translations
                .get(lang)
                .map(String::as_str)
                .ok_or_else(|| {
                    NavigationError::Translation(format!("'{}' not found in translations", lang))
                }),
            (Text::Localized(_), None) => Err(NavigationError::Translation(
                "text is localized but no language was resolved".to_string(),
            )),
        }
    }

    /// Resolves a menu title
    ///
    /// Stricter than [`resolve`](Text::resolve): once a language is in play,
    /// titles must be localized.
    pub(crate) fn resolve_title(&self, lang: Option<&str>) -> Result<&str, NavigationError> {
        match (self, lang) {
            (Text::Plain(value), None) => Ok(value),
            (Text::Plain(_), Some(_)) => Err(NavigationError::Translation(
                "when translation is enabled, titles should be localized".to_string(),
            )),
            (Text::Localized(translations), Some(lang)) => {
                translations.get(lang).map(String::as_str).ok_or_else(|| {
                    NavigationError::Translation(format!(
                        "translation for language '{}' was not found",
                        lang
                    ))
                })
            }
            (Text::Localized(_), None) => Err(NavigationError::Translation(
                "title is localized but no language was resolved".to_string(),
            )),
        }
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Text::Plain(value.to_string())
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Text::Plain(value)
    }
}

impl From<HashMap<String, String>> for Text {
    fn from(translations: HashMap<String, String>) -> Self {
        Text::Localized(translations)
    }
}

/// Collects the `{name}` placeholders of a rendered response, in order,
/// without duplicates
pub(crate) fn placeholders(input: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = input;
    while let Some(start) = rest.find('{') {
        rest = &rest[start + 1..];
        match rest.find('}') {
            Some(end) => {
                let name = &rest[..end];
                if !name.is_empty() && !name.contains('{') && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &rest[end + 1..];
            }
            None => break,
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_plain() {
        let text = Text::plain("Menu");
        assert_eq!(text.resolve(None).unwrap(), "Menu");
        assert_eq!(text.resolve(Some("sw")).unwrap(), "Menu");
    }

    #[test]
    fn resolve_localized() {
        let text = Text::localized(vec![("en", "Menu"), ("sw", "Menyu")]);
        assert_eq!(text.resolve(Some("sw")).unwrap(), "Menyu");
        assert!(text.resolve(Some("fr")).is_err());
        assert!(text.resolve(None).is_err());
    }

    #[test]
    fn resolve_title_strict() {
        let plain = Text::plain("Menu");
        assert_eq!(plain.resolve_title(None).unwrap(), "Menu");
        assert!(plain.resolve_title(Some("en")).is_err());

        let localized = Text::localized(vec![("en", "Menu")]);
        assert_eq!(localized.resolve_title(Some("en")).unwrap(), "Menu");
        assert!(localized.resolve_title(None).is_err());
    }

    #[test]
    fn collect_placeholders() {
        assert_eq!(
            placeholders("END Thanks {Name}, {Amount} received from {Name}"),
            vec!["Name".to_string(), "Amount".to_string()]
        );
        assert!(placeholders("CON Menu").is_empty());
        assert!(placeholders("broken {placeholder").is_empty());
        assert!(placeholders("{}").is_empty());
    }
}
