//! Text-marker matching for the exclusion predicates.
//!
//! Text and markers are both reduced to lowercase alphanumeric words joined
//! by single spaces, so a marker only matches whole words: `ev` finds
//! "EV Charging" but not "Level Pay", and `time of use` finds "Time-of-Use".

use crate::config::MarkerConfig;

/// Lowercases `text`, collapses every run of non-alphanumerics to a single
/// space, and pads both ends with a space.
///
/// # Examples
///
/// ```
/// use urdb_rates::filter::normalize_text;
///
/// assert_eq!(normalize_text("Time-of-Use (TOU)"), " time of use tou ");
/// ```
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with(' ') {
            out.push(' ');
        }
    }
    if !out.ends_with(' ') {
        out.push(' ');
    }
    out
}

/// One category of markers, pre-normalized for matching.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkerList {
    markers: Vec<String>,
}

impl MarkerList {
    /// Builds a list from raw marker strings. Blank markers are dropped.
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: raw
                .into_iter()
                .map(|m| normalize_text(m.as_ref()))
                .filter(|m| !m.trim().is_empty())
                .collect(),
        }
    }

    /// Returns true if any marker occurs in text produced by [`normalize_text`].
    pub fn matches(&self, normalized: &str) -> bool {
        self.markers.iter().any(|m| normalized.contains(m.as_str()))
    }
}

/// All four exclusion categories.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkerSet {
    /// Low-income program markers.
    pub low_income: MarkerList,
    /// Electric-vehicle markers.
    pub ev: MarkerList,
    /// Time-of-use markers.
    pub tou: MarkerList,
    /// Multi-unit building markers.
    pub multi_unit: MarkerList,
}

impl From<&MarkerConfig> for MarkerSet {
    fn from(config: &MarkerConfig) -> Self {
        Self {
            low_income: MarkerList::new(&config.low_income),
            ev: MarkerList::new(&config.ev),
            tou: MarkerList::new(&config.tou),
            multi_unit: MarkerList::new(&config.multi_unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_punctuation() {
        assert_eq!(
            normalize_text("Multi-Family / Master-Metered"),
            " multi family master metered "
        );
        assert_eq!(normalize_text(""), " ");
        assert_eq!(normalize_text("--"), " ");
    }

    #[test]
    fn test_marker_matches_whole_words_only() {
        let list = MarkerList::new(["ev"]);
        assert!(list.matches(&normalize_text("Residential EV Charging")));
        assert!(list.matches(&normalize_text("EV-TOU-5")));
        assert!(!list.matches(&normalize_text("Residential Level Pay")));
        assert!(!list.matches(&normalize_text("Every Day Service")));
    }

    #[test]
    fn test_multi_word_marker_ignores_punctuation() {
        let list = MarkerList::new(["time-of-use"]);
        assert!(list.matches(&normalize_text("Residential Time of Use")));
        assert!(list.matches(&normalize_text("TIME-OF-USE rate")));
        assert!(!list.matches(&normalize_text("Time of day")));
    }

    #[test]
    fn test_blank_markers_are_dropped() {
        let list = MarkerList::new(["", "  "]);
        assert!(!list.matches(&normalize_text("anything at all")));
    }

    #[test]
    fn test_marker_set_from_default_config() {
        let set = MarkerSet::from(&MarkerConfig::default());
        assert!(set.low_income.matches(&normalize_text("Low-Income Discount")));
        assert!(set.tou.matches(&normalize_text("Residential TOU")));
        assert!(set.multi_unit.matches(&normalize_text("Master Metered Apartments")));
        assert!(!set.ev.matches(&normalize_text("Residential Service")));
    }
}
