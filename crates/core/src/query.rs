//! Search-string builder shared by the providers
//!
//! Every provider accepts some variant of the `keyword qualifier:value` search
//! syntax. The builder neutralizes quotes in user input so a repository name
//! or keyword cannot break out of its term, and drops blank values so an
//! all-blank input builds the empty string.

use chrono::NaiveDate;

/// How double quotes inside a quoted term are handled
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// Backslash-escape quotes and backslashes (GitHub search syntax)
    #[default]
    Escape,
    /// Drop embedded quotes; the provider has no escape sequence
    Strip,
}

#[derive(Debug, Default, Clone)]
pub struct QueryBuilder {
    terms: Vec<String>,
    style: QuoteStyle,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: QuoteStyle) -> Self {
        Self {
            terms: Vec::new(),
            style,
        }
    }

    /// Add free text as a single quoted phrase
    pub fn phrase(mut self, text: &str) -> Self {
        let text = self.clean(text);
        if !text.is_empty() {
            let term = quote(&text, self.style);
            self.terms.push(term);
        }
        self
    }

    /// Add free text as whitespace-separated words
    ///
    /// Stray double quotes are removed so they cannot open a phrase that
    /// swallows the qualifiers that follow.
    pub fn words(mut self, text: &str) -> Self {
        let cleaned: Vec<String> = text
            .split_whitespace()
            .map(|word| word.replace('"', ""))
            .filter(|word| !word.is_empty())
            .collect();
        if !cleaned.is_empty() {
            self.terms.push(cleaned.join(" "));
        }
        self
    }

    /// Add `name:value`, quoting the value when it needs it
    pub fn qualifier(mut self, name: &str, value: &str) -> Self {
        let value = self.clean(value);
        if !value.is_empty() {
            let term = format!("{name}:{}", quote_if_needed(&value, self.style));
            self.terms.push(term);
        }
        self
    }

    pub fn qualifier_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.qualifier(name, value),
            None => self,
        }
    }

    /// Add one `name:value` term per value
    pub fn qualifiers<S: AsRef<str>>(self, name: &str, values: &[S]) -> Self {
        values
            .iter()
            .fold(self, |builder, value| builder.qualifier(name, value.as_ref()))
    }

    /// Add a term that is already in provider syntax
    pub fn raw(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        if !term.trim().is_empty() {
            self.terms.push(term);
        }
        self
    }

    pub fn raw_opt(self, term: Option<String>) -> Self {
        match term {
            Some(term) => self.raw(term),
            None => self,
        }
    }

    fn clean(&self, text: &str) -> String {
        match self.style {
            QuoteStyle::Escape => text.trim().to_string(),
            QuoteStyle::Strip => text.replace('"', "").trim().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn build(self) -> String {
        self.terms.join(" ")
    }
}

/// Wrap `text` in double quotes, neutralizing embedded quotes per `style`
pub fn quote(text: &str, style: QuoteStyle) -> String {
    match style {
        QuoteStyle::Escape => {
            let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        }
        QuoteStyle::Strip => format!("\"{}\"", text.replace('"', "")),
    }
}

fn quote_if_needed(value: &str, style: QuoteStyle) -> String {
    if value.chars().any(|c| c.is_whitespace() || c == '"') {
        quote(value, style)
    } else {
        value.to_string()
    }
}

/// `name:from..to` style date range, open on either side
///
/// Returns `None` when neither bound is set.
pub fn dotted_date_range(
    name: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Option<String> {
    match (from, to) {
        (Some(from), Some(to)) => Some(format!("{name}:{}..{}", fmt_date(from), fmt_date(to))),
        (Some(from), None) => Some(format!("{name}:>={}", fmt_date(from))),
        (None, Some(to)) => Some(format!("{name}:<={}", fmt_date(to))),
        (None, None) => None,
    }
}

pub fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_blank_input_builds_empty_query() {
        let query = QueryBuilder::new()
            .phrase("   ")
            .words("")
            .qualifier("repo", " ")
            .qualifiers::<&str>("label", &[])
            .raw_opt(None)
            .build();
        assert_eq!(query, "");
    }

    #[test]
    fn test_phrase_escapes_embedded_quotes() {
        let query = QueryBuilder::new().phrase(r#"say "hi" \o/"#).build();
        assert_eq!(query, r#""say \"hi\" \\o/""#);
    }

    #[test]
    fn test_strip_style_drops_quotes_and_keeps_backslashes() {
        let query = QueryBuilder::with_style(QuoteStyle::Strip)
            .qualifier("title", r#"a "b" c\d"#)
            .qualifier("user", r#""alice""#)
            .qualifier("tag", r#""""#)
            .phrase(r#"say "hi""#)
            .build();
        assert_eq!(query, r#"title:"a b c\d" user:alice "say hi""#);
    }

    #[test]
    fn test_escape_style_is_the_default() {
        let query = QueryBuilder::new().qualifier("label", r#"a "b""#).build();
        assert_eq!(query, r#"label:"a \"b\"""#);
    }

    #[test]
    fn test_words_strip_stray_quotes() {
        let query = QueryBuilder::new()
            .words(r#"  rust "async   "#)
            .qualifier("tag", "tokio")
            .build();
        assert_eq!(query, "rust async tag:tokio");
    }

    #[test]
    fn test_qualifier_values_with_spaces_are_quoted() {
        let query = QueryBuilder::new()
            .qualifier("label", "good first issue")
            .qualifiers("repo", &["rust-lang/rust", "tokio-rs/tokio"])
            .build();
        assert_eq!(
            query,
            r#"label:"good first issue" repo:rust-lang/rust repo:tokio-rs/tokio"#
        );
    }

    #[test]
    fn test_dotted_date_range_variants() {
        assert_eq!(
            dotted_date_range("created", Some(date("2024-01-01")), Some(date("2024-02-01"))),
            Some("created:2024-01-01..2024-02-01".to_string())
        );
        assert_eq!(
            dotted_date_range("created", Some(date("2024-01-01")), None),
            Some("created:>=2024-01-01".to_string())
        );
        assert_eq!(
            dotted_date_range("created", None, Some(date("2024-02-01"))),
            Some("created:<=2024-02-01".to_string())
        );
        assert_eq!(dotted_date_range("created", None, None), None);
    }
}
