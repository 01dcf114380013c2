use crate::data::record::Record;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{trace, warn};

/// Compiled regex size cap, keeps hostile patterns from eating memory
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// How the search term is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Case-insensitive substring, every character taken literally
    #[default]
    Literal,
    /// Case-insensitive regular expression; invalid patterns match nothing
    Regex,
    /// Skim-style fuzzy match
    Fuzzy,
}

impl FilterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Regex => "regex",
            Self::Fuzzy => "fuzzy",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Literal => Self::Regex,
            Self::Regex => Self::Fuzzy,
            Self::Fuzzy => Self::Literal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterOptions {
    pub mode: FilterMode,
    /// Also match `id`, `price` and `quantity` rendered as text
    pub include_numeric_fields: bool,
}

/// Derives the visible record sequence from a record set and a search term.
///
/// Every function here is pure: the same records and term always give the
/// same result, in the same relative order as the input.
pub struct FilterEngine;

impl FilterEngine {
    /// Literal, text-fields-only filtering
    pub fn apply(records: &[Record], term: &str) -> Vec<Record> {
        Self::apply_with(records, term, &FilterOptions::default())
    }

    pub fn apply_with(records: &[Record], term: &str, options: &FilterOptions) -> Vec<Record> {
        if term.is_empty() {
            return records.to_vec();
        }

        let matched = match options.mode {
            FilterMode::Literal => Self::literal(records, term, options.include_numeric_fields),
            FilterMode::Regex => Self::regex(records, term, options.include_numeric_fields),
            FilterMode::Fuzzy => Self::fuzzy(records, term, options.include_numeric_fields),
        };

        trace!(
            target: "search",
            "{} filter '{}' kept {}/{} records",
            options.mode.as_str(),
            term,
            matched.len(),
            records.len()
        );
        matched
    }

    fn searchable_fields(record: &Record, include_numeric: bool) -> Vec<Cow<'_, str>> {
        let mut fields = vec![
            Cow::Borrowed(record.name.as_str()),
            Cow::Borrowed(record.category.as_str()),
        ];
        if include_numeric {
            fields.push(Cow::Owned(record.id.to_string()));
            fields.push(Cow::Owned(record.price.to_string()));
            fields.push(Cow::Owned(record.quantity.to_string()));
        }
        fields
    }

    fn literal(records: &[Record], term: &str, include_numeric: bool) -> Vec<Record> {
        let needle = term.to_lowercase();
        records
            .iter()
            .filter(|record| {
                Self::searchable_fields(record, include_numeric)
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    fn regex(records: &[Record], pattern: &str, include_numeric: bool) -> Vec<Record> {
        let regex = match RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
        {
            Ok(regex) => regex,
            Err(err) => {
                warn!(target: "search", "Invalid pattern '{}', matching nothing: {}", pattern, err);
                return Vec::new();
            }
        };

        records
            .iter()
            .filter(|record| {
                Self::searchable_fields(record, include_numeric)
                    .iter()
                    .any(|field| regex.is_match(field))
            })
            .cloned()
            .collect()
    }

    fn fuzzy(records: &[Record], pattern: &str, include_numeric: bool) -> Vec<Record> {
        let matcher = SkimMatcherV2::default().ignore_case();
        records
            .iter()
            .filter(|record| {
                Self::searchable_fields(record, include_numeric)
                    .iter()
                    .any(|field| matcher.fuzzy_match(field, pattern).is_some_and(|s| s > 0))
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FilterKey {
    version: u64,
    term: String,
    options: FilterOptions,
}

/// Remembers the last filter result so redraws don't recompute it.
///
/// `version` identifies the record set (the page cache version); the record
/// loader only runs on a miss.
#[derive(Debug, Default)]
pub struct MemoizedFilter {
    key: Option<FilterKey>,
    result: Arc<Vec<Record>>,
    hits: u64,
    misses: u64,
}

impl MemoizedFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply<F>(
        &mut self,
        version: u64,
        load_records: F,
        term: &str,
        options: &FilterOptions,
    ) -> Arc<Vec<Record>>
    where
        F: FnOnce() -> Vec<Record>,
    {
        let key = FilterKey {
            version,
            term: term.to_string(),
            options: options.clone(),
        };
        if self.key.as_ref() == Some(&key) {
            self.hits += 1;
            return self.result.clone();
        }

        self.misses += 1;
        let records = load_records();
        self.result = Arc::new(FilterEngine::apply_with(&records, term, options));
        self.key = Some(key);
        self.result.clone()
    }

    pub fn clear(&mut self) {
        self.key = None;
        self.result = Arc::new(Vec::new());
    }

    /// (hits, misses)
    pub fn counters(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Record> {
        vec![
            Record::new(1, "Essence Mascara Lash Princess", "beauty", 9.99, 5),
            Record::new(2, "Eyeshadow Palette with Mirror", "beauty", 19.99, 44),
            Record::new(3, "Calvin Klein CK One", "fragrances", 49.99, 17),
            Record::new(4, "Annibale Colombo Bed", "furniture", 1899.99, 47),
            Record::new(5, "Apple (Green)", "groceries", 1.99, 99),
        ]
    }

    fn ids(records: &[Record]) -> Vec<u64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn empty_term_returns_everything_in_order() {
        let records = catalog();
        assert_eq!(FilterEngine::apply(&records, ""), records);
    }

    #[test]
    fn matches_name_and_category_case_insensitively() {
        let records = catalog();
        assert_eq!(ids(&FilterEngine::apply(&records, "BEAUTY")), vec![1, 2]);
        assert_eq!(ids(&FilterEngine::apply(&records, "klein")), vec![3]);
        assert_eq!(ids(&FilterEngine::apply(&records, "e")), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn numeric_fields_only_when_enabled() {
        let records = catalog();
        assert!(FilterEngine::apply(&records, "1899").is_empty());

        let options = FilterOptions {
            include_numeric_fields: true,
            ..Default::default()
        };
        assert_eq!(ids(&FilterEngine::apply_with(&records, "1899", &options)), vec![4]);
        assert_eq!(ids(&FilterEngine::apply_with(&records, "99", &options)), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn literal_mode_treats_pattern_syntax_as_text() {
        let records = catalog();
        assert_eq!(ids(&FilterEngine::apply(&records, "(green")), vec![5]);
        assert!(FilterEngine::apply(&records, "[").is_empty());
        assert!(FilterEngine::apply(&records, ".*").is_empty());
    }

    #[test]
    fn invalid_regex_fails_closed() {
        let records = catalog();
        let options = FilterOptions {
            mode: FilterMode::Regex,
            ..Default::default()
        };
        assert!(FilterEngine::apply_with(&records, "(unbalanced", &options).is_empty());
        assert!(FilterEngine::apply_with(&records, "[", &options).is_empty());
        assert_eq!(ids(&FilterEngine::apply_with(&records, "^ca|bed$", &options)), vec![3, 4]);
    }

    #[test]
    fn fuzzy_mode_keeps_source_order() {
        let records = catalog();
        let options = FilterOptions {
            mode: FilterMode::Fuzzy,
            ..Default::default()
        };
        let matched = FilterEngine::apply_with(&records, "frgrnc", &options);
        assert_eq!(ids(&matched), vec![3]);
    }

    #[test]
    fn apply_is_deterministic() {
        let records = catalog();
        let first = FilterEngine::apply(&records, "a");
        for _ in 0..5 {
            assert_eq!(FilterEngine::apply(&records, "a"), first);
        }
    }

    #[test]
    fn memoized_filter_skips_recompute_for_same_key() {
        let mut memo = MemoizedFilter::new();
        let options = FilterOptions::default();
        let mut loads = 0;

        let first = memo.apply(1, || { loads += 1; catalog() }, "beauty", &options);
        let second = memo.apply(1, || { loads += 1; catalog() }, "beauty", &options);
        assert!(Arc::ptr_eq(&first, &second));

        memo.apply(2, || { loads += 1; catalog() }, "beauty", &options);
        memo.apply(2, || { loads += 1; catalog() }, "bed", &options);

        assert_eq!(loads, 3);
        assert_eq!(memo.counters(), (1, 3));
    }
}
