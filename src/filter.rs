use crate::config::FilterConfig;
use crate::error::CompileError;
use regex::bytes::Regex;
use std::borrow::Cow;
use std::sync::Arc;

/// A compiled rewrite rule.
#[derive(Debug, Clone)]
pub struct Filter {
    regex: Regex,
    replacement: String,
}

impl Filter {
    /// Compiles `pattern`, failing if it is not a valid regular expression.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, CompileError> {
        let regex = Regex::new(pattern).map_err(|source| CompileError {
            pattern: pattern.to_owned(),
            source,
        })?;

        Ok(Self {
            regex,
            replacement: replacement.into(),
        })
    }

    /// Returns the source pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns the replacement template.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replaces every non-overlapping match in `text`.
    ///
    /// Returns the input borrowed when nothing matched.
    pub fn apply<'a>(&self, text: &'a [u8]) -> Cow<'a, [u8]> {
        self.regex.replace_all(text, self.replacement.as_bytes())
    }
}

/// An ordered, immutable list of compiled filters.
///
/// Cloning is cheap; clones share the compiled expressions.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Arc<[Filter]>,
}

impl FilterSet {
    /// Compiles every rule, stopping at the first invalid pattern.
    pub fn compile(configs: &[FilterConfig]) -> Result<Self, CompileError> {
        let filters = configs
            .iter()
            .map(|config| Filter::new(&config.regex, config.replacement.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            filters: filters.into(),
        })
    }

    /// Number of filters in the set.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if the set holds no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterates over the filters in application order.
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    /// Runs every filter over `body`, left to right, each one over the whole
    /// output of the previous.
    pub fn apply<'a>(&self, body: &'a [u8]) -> Cow<'a, [u8]> {
        let mut text = Cow::Borrowed(body);

        for filter in self.filters.iter() {
            let rewritten = match filter.apply(&text) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(bytes) => bytes,
            };
            text = Cow::Owned(rewritten);
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(rules: &[(&str, &str)]) -> FilterSet {
        let configs: Vec<_> = rules
            .iter()
            .map(|(regex, replacement)| FilterConfig::new(*regex, *replacement))
            .collect();
        FilterSet::compile(&configs).unwrap()
    }

    #[test]
    fn test_single_filter() {
        let filters = compile(&[("foo", "bar")]);
        assert_eq!(&*filters.apply(b"foo is the new bar"), b"bar is the new bar");
    }

    #[test]
    fn test_filters_apply_in_order() {
        let forward = compile(&[("foo", "bar"), ("bar", "foo")]);
        assert_eq!(&*forward.apply(b"foo is the new bar"), b"foo is the new foo");

        let reverse = compile(&[("bar", "foo"), ("foo", "bar")]);
        assert_eq!(&*reverse.apply(b"foo is the new bar"), b"bar is the new bar");
    }

    #[test]
    fn test_replaces_every_match() {
        let filters = compile(&[("o", "0")]);
        assert_eq!(&*filters.apply(b"foo\nboo"), b"f00\nb00");
    }

    #[test]
    fn test_match_spans_lines() {
        let filters = compile(&[(r"(?s)<!--.*?-->", "")]);
        assert_eq!(&*filters.apply(b"a<!-- one\ntwo -->b"), b"ab");
    }

    #[test]
    fn test_capture_group_replacement() {
        let filters = compile(&[
            (r"(\w+)@example\.com", "$1@example.org"),
            (r"(?P<scheme>http)://", "${scheme}s://"),
        ]);
        assert_eq!(
            &*filters.apply(b"mail alice@example.com at http://host"),
            b"mail alice@example.org at https://host"
        );
    }

    #[test]
    fn test_no_match_borrows_input() {
        let filters = compile(&[("foo", "bar"), ("baz", "qux")]);
        assert!(matches!(filters.apply(b"nothing here"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_non_utf8_body() {
        let filters = compile(&[("foo", "bar")]);
        assert_eq!(&*filters.apply(b"\xff\xfefoo\x00"), b"\xff\xfebar\x00");
    }

    #[test]
    fn test_empty_set_is_identity() {
        let filters = FilterSet::default();
        assert!(filters.is_empty());
        assert_eq!(&*filters.apply(b"unchanged"), b"unchanged");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = FilterSet::compile(&[
            FilterConfig::new("foo", "bar"),
            FilterConfig::new("*", "bar"),
        ])
        .unwrap_err();
        assert_eq!(err.pattern, "*");
        assert!(err.to_string().contains("`*`"));
    }

    #[test]
    fn test_valid_patterns_compile() {
        let filters = compile(&[("foo", "bar"), ("bar", "foo")]);
        assert_eq!(filters.len(), 2);
        let rules: Vec<_> = filters
            .iter()
            .map(|filter| (filter.pattern(), filter.replacement()))
            .collect();
        assert_eq!(rules, vec![("foo", "bar"), ("bar", "foo")]);
    }
}
