//! Utility-to-ZIP mapping records.
//!
//! These come from the two EIA-derived mapping files: one listing
//! investor-owned utilities and one listing everything else.

use serde::{Deserialize, Serialize};

/// Ownership class of a utility.
///
/// The class is decided by which mapping file a record was loaded from; the
/// finer-grained label ("Municipal", "Cooperative", ...) is kept on the
/// record as [`UtilityZipRecord::ownership_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    /// Investor-owned utility.
    InvestorOwned,
    /// Municipal, cooperative, federal, or other non-IOU utility.
    NonInvestorOwned,
}

/// Restricts which ownership classes are in scope for an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipFilter {
    /// Both investor-owned and non-IOU utilities.
    #[default]
    Any,
    /// Investor-owned utilities only.
    InvestorOwned,
    /// Non-IOU utilities only.
    NonInvestorOwned,
}

impl OwnershipFilter {
    /// Returns true if the given ownership class passes this filter.
    pub fn admits(self, ownership: Ownership) -> bool {
        match self {
            OwnershipFilter::Any => true,
            OwnershipFilter::InvestorOwned => ownership == Ownership::InvestorOwned,
            OwnershipFilter::NonInvestorOwned => ownership == Ownership::NonInvestorOwned,
        }
    }
}

/// One row of a ZIP-to-utility mapping file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityZipRecord {
    /// Five-digit, zero-padded ZIP code.
    pub zip: String,
    /// EIA utility identifier.
    pub utility_id: u32,
    /// Utility name as given in the mapping file.
    pub utility_name: String,
    /// Ownership class.
    pub ownership: Ownership,
    /// Raw ownership label from the file.
    pub ownership_label: String,
    /// Two-letter state code, uppercased, if the file carries one.
    pub state: Option<String>,
    /// Service type ("Bundled", "Delivery", ...), if the file carries one.
    pub service_type: Option<String>,
}

impl UtilityZipRecord {
    /// Returns true if this record belongs to the given state.
    ///
    /// Records without a state never match a state restriction.
    pub fn in_state(&self, state: &str) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(state))
    }

    /// Returns true if the mapping lists this utility as a delivery-only
    /// service provider for the ZIP.
    pub fn is_delivery(&self) -> bool {
        self.service_type
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("delivery"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ownership: Ownership, state: Option<&str>) -> UtilityZipRecord {
        UtilityZipRecord {
            zip: "01002".to_string(),
            utility_id: 13206,
            utility_name: "Massachusetts Electric Co".to_string(),
            ownership,
            ownership_label: "Investor Owned".to_string(),
            state: state.map(str::to_string),
            service_type: Some("Bundled".to_string()),
        }
    }

    #[test]
    fn test_any_filter_admits_both_classes() {
        assert!(OwnershipFilter::Any.admits(Ownership::InvestorOwned));
        assert!(OwnershipFilter::Any.admits(Ownership::NonInvestorOwned));
    }

    #[test]
    fn test_iou_filter_rejects_non_iou() {
        assert!(OwnershipFilter::InvestorOwned.admits(Ownership::InvestorOwned));
        assert!(!OwnershipFilter::InvestorOwned.admits(Ownership::NonInvestorOwned));
    }

    #[test]
    fn test_in_state_is_case_insensitive() {
        let r = record(Ownership::InvestorOwned, Some("MA"));
        assert!(r.in_state("ma"));
        assert!(!r.in_state("NH"));
    }

    #[test]
    fn test_is_delivery_reads_service_type() {
        let mut r = record(Ownership::InvestorOwned, Some("MA"));
        assert!(!r.is_delivery());
        r.service_type = Some(" DELIVERY ".to_string());
        assert!(r.is_delivery());
        r.service_type = None;
        assert!(!r.is_delivery());
    }

    #[test]
    fn test_in_state_without_state_never_matches() {
        let r = record(Ownership::InvestorOwned, None);
        assert!(!r.in_state("MA"));
    }

    #[test]
    fn test_ownership_filter_deserialization() {
        let f: OwnershipFilter = serde_json::from_str("\"non_investor_owned\"").unwrap();
        assert_eq!(f, OwnershipFilter::NonInvestorOwned);
    }
}
