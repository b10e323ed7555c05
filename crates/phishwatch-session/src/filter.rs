//! Search, filter and display helpers for the link list.

use phishwatch_api_models::LinkRecord;

/// Display width used by the list view for URLs.
pub const URL_DISPLAY_WIDTH: usize = 30;

/// Text shown when no record survives the filter.
pub const EMPTY_FILTER_MESSAGE: &str = "No links match your filter.";

/// Which records the list shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterOption {
    /// Every record.
    #[default]
    All,
    /// `is_safe` only.
    Safe,
    /// Not `is_safe`.
    Unsafe,
    /// `is_blocked` only.
    Blocked,
    /// Not `is_blocked`.
    Unblocked,
}

impl FilterOption {
    /// Every option in display order.
    pub const ALL: [Self; 5] = [
        Self::All,
        Self::Safe,
        Self::Unsafe,
        Self::Blocked,
        Self::Unblocked,
    ];

    /// Parse a case-insensitive option name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|option| option.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Safe => "safe",
            Self::Unsafe => "unsafe",
            Self::Blocked => "blocked",
            Self::Unblocked => "unblocked",
        }
    }

    /// Whether `record` passes this option.
    #[must_use]
    pub const fn matches(self, record: &LinkRecord) -> bool {
        match self {
            Self::All => true,
            Self::Safe => record.is_safe,
            Self::Unsafe => !record.is_safe,
            Self::Blocked => record.is_blocked,
            Self::Unblocked => !record.is_blocked,
        }
    }
}

/// Search text plus filter option.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkFilter {
    /// Case-insensitive substring matched against the domain.
    pub search: String,
    /// Status filter.
    pub option: FilterOption,
}

impl LinkFilter {
    /// Filter with both criteria.
    pub fn new(search: impl Into<String>, option: FilterOption) -> Self {
        Self {
            search: search.into(),
            option,
        }
    }

    /// Records passing both criteria, in input order.
    #[must_use]
    pub fn apply<'a>(&self, links: &'a [LinkRecord]) -> Vec<&'a LinkRecord> {
        let needle = self.search.to_lowercase();
        links
            .iter()
            .filter(|record| record.domain.to_lowercase().contains(&needle))
            .filter(|record| self.option.matches(record))
            .collect()
    }
}

/// Shorten `url` to `width` characters followed by `...` when it is longer.
#[must_use]
pub fn truncate_url(url: &str, width: usize) -> String {
    url.char_indices()
        .nth(width)
        .map_or_else(|| url.to_string(), |(cut, _)| format!("{}...", &url[..cut]))
}

/// Label for the safety column.
#[must_use]
pub const fn safety_label(record: &LinkRecord) -> &'static str {
    if record.is_safe { "Safe" } else { "Unknown" }
}

/// Label for the status column.
#[must_use]
pub const fn block_label(record: &LinkRecord) -> &'static str {
    if record.is_blocked {
        "Blocked"
    } else {
        "Unblocked"
    }
}

/// Label next to the toggle control.
#[must_use]
pub const fn toggle_label(record: &LinkRecord) -> &'static str {
    if record.is_blocked { "Blocked" } else { "Allowed" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phishwatch_test_support::fixtures::{link, sample_links};

    fn urls(records: &[&LinkRecord]) -> Vec<String> {
        records.iter().map(|record| record.url.clone()).collect()
    }

    #[test]
    fn blocked_filter_keeps_only_blocked_records_in_order() {
        let links = sample_links();
        let kept = LinkFilter::new("", FilterOption::Blocked).apply(&links);
        assert_eq!(
            urls(&kept),
            vec!["http://example.com/b", "http://phish.example/login"]
        );
    }

    #[test]
    fn search_is_a_case_insensitive_domain_match() {
        let links = sample_links();
        let kept = LinkFilter::new("EXAMPLE.COM", FilterOption::All).apply(&links);
        assert_eq!(kept.len(), 2);

        let kept = LinkFilter::new("phish", FilterOption::Safe).apply(&links);
        assert!(kept.is_empty());

        let kept = LinkFilter::new("", FilterOption::Unblocked).apply(&links);
        assert_eq!(
            urls(&kept),
            vec!["http://example.com/a", "https://bank-secure.example/verify"]
        );
    }

    #[test]
    fn options_parse_by_name() {
        for option in FilterOption::ALL {
            assert_eq!(FilterOption::parse(option.as_str()), Some(option));
        }
        assert_eq!(FilterOption::parse(" Unsafe "), Some(FilterOption::Unsafe));
        assert_eq!(FilterOption::parse("quarantined"), None);
    }

    #[test]
    fn long_urls_are_cut_at_the_display_width() {
        assert_eq!(truncate_url("http://short.example", URL_DISPLAY_WIDTH), "http://short.example");
        let long = "https://bank-secure.example/verify/account";
        assert_eq!(
            truncate_url(long, URL_DISPLAY_WIDTH),
            "https://bank-secure.example/ve..."
        );
        let exact = "a".repeat(URL_DISPLAY_WIDTH);
        assert_eq!(truncate_url(&exact, URL_DISPLAY_WIDTH), exact);
        assert_eq!(truncate_url("ééé", 2), "éé...");
    }

    #[test]
    fn labels_follow_the_record_flags() {
        let record = link("http://x.example", "x.example", false, true);
        assert_eq!(safety_label(&record), "Unknown");
        assert_eq!(block_label(&record), "Blocked");
        assert_eq!(toggle_label(&record), "Blocked");

        let record = link("http://y.example", "y.example", true, false);
        assert_eq!(safety_label(&record), "Safe");
        assert_eq!(block_label(&record), "Unblocked");
        assert_eq!(toggle_label(&record), "Allowed");
    }
}
