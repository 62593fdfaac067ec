//! CSV loaders for the ZIP mapping files and the URDB export.
//!
//! Loading is eager. An unreadable file or a missing required column is
//! fatal; a malformed row is skipped and counted in [`Loaded::skipped_rows`].

mod columns;
mod urdb;
mod zip_map;

pub use columns::normalize_zip;
pub use urdb::{load_urdb, read_urdb};
pub use zip_map::{load_zip_map, load_zip_maps, read_zip_map};

use crate::error::RateError;

/// Records read from one or more files, with a count of skipped rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    /// Successfully parsed records in file order.
    pub records: Vec<T>,
    /// Rows that could not be parsed.
    pub skipped_rows: usize,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped_rows: 0,
        }
    }
}

impl<T> Loaded<T> {
    /// Appends another load's records and adds its skip count.
    pub fn merge(&mut self, other: Loaded<T>) {
        self.records.extend(other.records);
        self.skipped_rows += other.skipped_rows;
    }
}

/// Maps a file-level CSV failure to the error taxonomy.
fn csv_error(origin: &str, error: csv::Error) -> RateError {
    if error.is_io_error() {
        RateError::FileAccess {
            path: origin.to_string(),
            message: error.to_string(),
        }
    } else {
        RateError::DataFormat {
            path: origin.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_concatenates_and_sums() {
        let mut a = Loaded {
            records: vec![1, 2],
            skipped_rows: 1,
        };
        let b = Loaded {
            records: vec![3],
            skipped_rows: 2,
        };
        a.merge(b);
        assert_eq!(a.records, vec![1, 2, 3]);
        assert_eq!(a.skipped_rows, 3);
    }
}
