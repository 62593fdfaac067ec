//! Joining tariffs to the ZIP codes their utility serves.

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::config::ScopeConfig;
use crate::error::{RateError, RateResult};
use crate::models::UtilityZipRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
struct UtilityEntry {
    name: String,
    ownership: String,
    delivery: bool,
    zips: BTreeSet<String>,
}

/// How a utility ID relates to the mapping files and the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtilityMatch<'a> {
    /// Mapped and inside the scope.
    InScope {
        /// Name from the mapping file.
        utility_name: &'a str,
        /// Ownership label from the mapping file.
        ownership: &'a str,
        /// Served ZIP codes inside the scope, ascending.
        zips: &'a BTreeSet<String>,
    },
    /// Absent from every mapping file.
    Unmapped,
    /// Mapped, but none of its service area is in scope.
    OutOfScope,
}

/// Utility ID to served ZIP codes, restricted to a [`ScopeConfig`].
///
/// State and ownership decide which mapping records count toward a
/// utility's service area. A scope ZIP selects the utilities that serve it;
/// each selected utility still lists its whole in-scope service area.
///
/// # Example
///
/// ```
/// use urdb_rates::calculation::{UtilityIndex, UtilityMatch};
/// use urdb_rates::config::ScopeConfig;
///
/// let index = UtilityIndex::build(&[], &ScopeConfig::default()).unwrap();
/// assert_eq!(index.lookup(13206), UtilityMatch::Unmapped);
/// ```
#[derive(Debug, Clone, Default)]
pub struct UtilityIndex {
    in_scope: BTreeMap<u32, UtilityEntry>,
    mapped: BTreeSet<u32>,
    zip_restricted: bool,
}

impl UtilityIndex {
    /// Builds the index from mapping records.
    ///
    /// `scope` is expected to be normalized (uppercase state, five-digit ZIP).
    ///
    /// # Errors
    ///
    /// Returns [`RateError::NoUtilitiesForZip`] when the scope names a ZIP
    /// that no in-scope utility serves.
    pub fn build(records: &[UtilityZipRecord], scope: &ScopeConfig) -> RateResult<Self> {
        let mut in_scope: BTreeMap<u32, UtilityEntry> = BTreeMap::new();
        let mut mapped = BTreeSet::new();

        for record in records {
            mapped.insert(record.utility_id);

            let state_ok = scope
                .state
                .as_deref()
                .is_none_or(|state| record.in_state(state));
            if !state_ok || !scope.ownership.admits(record.ownership) {
                continue;
            }

            let entry = in_scope
                .entry(record.utility_id)
                .or_insert_with(|| UtilityEntry {
                    name: record.utility_name.clone(),
                    ownership: record.ownership_label.clone(),
                    delivery: false,
                    zips: BTreeSet::new(),
                });
            entry.delivery |= record.is_delivery();
            entry.zips.insert(record.zip.clone());
        }

        if let Some(zip) = &scope.zip {
            in_scope.retain(|_, entry| entry.zips.contains(zip));
            if in_scope.is_empty() {
                return Err(RateError::NoUtilitiesForZip { zip: zip.clone() });
            }
        }

        info!(
            mapped_utilities = mapped.len(),
            in_scope_utilities = in_scope.len(),
            "Built utility ZIP index"
        );

        Ok(Self {
            in_scope,
            mapped,
            zip_restricted: scope.zip.is_some(),
        })
    }

    /// Classifies a utility ID against the mapping and scope.
    pub fn lookup(&self, utility_id: u32) -> UtilityMatch<'_> {
        if let Some(entry) = self.in_scope.get(&utility_id) {
            return UtilityMatch::InScope {
                utility_name: &entry.name,
                ownership: &entry.ownership,
                zips: &entry.zips,
            };
        }
        if self.zip_restricted || self.mapped.contains(&utility_id) {
            UtilityMatch::OutOfScope
        } else {
            UtilityMatch::Unmapped
        }
    }

    /// In-scope utilities that the mapping lists as delivery service for at
    /// least one of their in-scope ZIP codes.
    pub fn delivery_utilities(&self) -> BTreeSet<u32> {
        self.in_scope
            .iter()
            .filter(|(_, entry)| entry.delivery)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of utilities with at least one in-scope ZIP.
    pub fn in_scope_count(&self) -> usize {
        self.in_scope.len()
    }
}
