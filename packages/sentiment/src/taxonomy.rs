//! Issue categories and their keyword patterns.

use regex::Regex;
use serde::Deserialize;

use crate::SentimentError;

/// Embedded default taxonomy.
const DEFAULT_TAXONOMY_TOML: &str = include_str!("../config/issues.toml");

/// Number of categories in the embedded taxonomy.
#[cfg(test)]
const EXPECTED_CATEGORY_COUNT: usize = 9;

#[derive(Debug, Deserialize)]
struct TaxonomyDefinition {
    category: Vec<CategoryDefinition>,
}

#[derive(Debug, Deserialize)]
struct CategoryDefinition {
    name: String,
    keywords: Vec<String>,
}

/// One complaint category.
#[derive(Debug, Clone)]
pub struct IssueCategory {
    name: String,
    patterns: Vec<Regex>,
}

impl IssueCategory {
    /// Category name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether any keyword occurs in `text` as a whole word.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }
}

/// Ordered complaint categories. Order breaks ranking ties.
#[derive(Debug, Clone)]
pub struct IssueTaxonomy {
    categories: Vec<IssueCategory>,
}

impl IssueTaxonomy {
    /// Builds a taxonomy from `(name, keywords)` pairs. Each keyword is
    /// matched literally, case-insensitively, on word boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Pattern`] if a keyword cannot be compiled.
    pub fn new<I, K>(categories: I) -> Result<Self, SentimentError>
    where
        I: IntoIterator<Item = (String, K)>,
        K: IntoIterator<Item = String>,
    {
        let categories = categories
            .into_iter()
            .map(|(name, keywords)| -> Result<IssueCategory, SentimentError> {
                let patterns = keywords
                    .into_iter()
                    .map(|kw| {
                        let pattern = format!(r"(?i)\b{}\b", regex::escape(kw.trim()));
                        Regex::new(&pattern).map_err(|source| SentimentError::Pattern {
                            category: name.clone(),
                            source,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(IssueCategory { name, patterns })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { categories })
    }

    /// Parses a taxonomy from TOML `[[category]]` tables with `name` and
    /// `keywords`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Toml`] if the document is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self, SentimentError> {
        let def: TaxonomyDefinition = toml::de::from_str(toml_str)?;
        Self::new(def.category.into_iter().map(|c| (c.name, c.keywords)))
    }

    /// The built-in clinic review taxonomy.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded taxonomy is invalid.
    pub fn embedded() -> Result<Self, SentimentError> {
        Self::from_toml(DEFAULT_TAXONOMY_TOML)
    }

    /// Categories in taxonomy order.
    #[must_use]
    pub fn categories(&self) -> &[IssueCategory] {
        &self.categories
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn loads_embedded_taxonomy() {
        let taxonomy = IssueTaxonomy::embedded().unwrap();
        assert_eq!(
            taxonomy.categories().len(),
            EXPECTED_CATEGORY_COUNT,
            "Update EXPECTED_CATEGORY_COUNT after adding/removing categories."
        );
        assert_eq!(taxonomy.categories()[0].name(), "Wait times");
    }

    #[test]
    fn category_names_are_unique() {
        let taxonomy = IssueTaxonomy::embedded().unwrap();
        let mut seen = BTreeSet::new();
        for category in taxonomy.categories() {
            assert!(seen.insert(category.name()), "Duplicate category: {}", category.name());
        }
    }

    #[test]
    fn keywords_match_whole_words_only() {
        let taxonomy = IssueTaxonomy::new([(
            "Wait times".to_string(),
            vec!["wait".to_string(), "long wait".to_string()],
        )])
        .unwrap();
        let wait = &taxonomy.categories()[0];

        assert!(wait.matches("the wait was long"));
        assert!(wait.matches("A LONG WAIT"));
        assert!(!wait.matches("they were awaiting results"));
        assert!(!wait.matches("waiter"));
    }

    #[test]
    fn apostrophes_in_keywords_match() {
        let taxonomy = IssueTaxonomy::embedded().unwrap();
        let staff = taxonomy
            .categories()
            .iter()
            .find(|c| c.name() == "Staff attitude / communication")
            .unwrap();
        assert!(staff.matches("she didn't listen at all"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            IssueTaxonomy::from_toml("[[category]]\nname = 1"),
            Err(SentimentError::Toml(_))
        ));
    }
}
