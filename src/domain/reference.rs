//! Transaction reference generation.
//!
//! References look like `LSUC_20240315_3FA94C0B1D2E`: an institutional prefix,
//! the UTC date and 12 uppercase hex characters taken from a SHA-256 digest of
//! the current time and a random UUID. Uniqueness is not guaranteed by
//! construction; callers check the store before inserting.

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const DEFAULT_PREFIX: &str = "LSUC";
const SUFFIX_LEN: usize = 12;
const DATE_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct ReferenceGenerator {
    prefix: String,
}

impl Default for ReferenceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl ReferenceGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn generate(&self) -> String {
        let now = Utc::now();
        let seed = format!(
            "{}{}",
            now.timestamp_nanos_opt().unwrap_or_default(),
            Uuid::new_v4()
        );
        let digest = hex::encode(Sha256::digest(seed.as_bytes()));

        format!(
            "{}_{}_{}",
            self.prefix,
            now.format("%Y%m%d"),
            digest[..SUFFIX_LEN].to_uppercase()
        )
    }

    /// Checks that `reference` has the shape produced by [`generate`](Self::generate).
    pub fn is_well_formed(&self, reference: &str) -> bool {
        let Some(rest) = reference
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
        else {
            return false;
        };

        let Some((date, suffix)) = rest.split_once('_') else {
            return false;
        };

        date.len() == DATE_LEN
            && date.chars().all(|ch| ch.is_ascii_digit())
            && suffix.len() == SUFFIX_LEN
            && suffix
                .chars()
                .all(|ch| ch.is_ascii_digit() || ('A'..='F').contains(&ch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_reference_is_well_formed() {
        let generator = ReferenceGenerator::default();
        let reference = generator.generate();

        assert!(reference.starts_with("LSUC_"));
        assert_eq!(reference.len(), "LSUC_".len() + DATE_LEN + 1 + SUFFIX_LEN);
        assert!(generator.is_well_formed(&reference), "{}", reference);
    }

    #[test]
    fn reference_carries_todays_date() {
        let reference = ReferenceGenerator::default().generate();
        let today = Utc::now().format("%Y%m%d").to_string();
        // Tolerate a run that straddles midnight.
        let yesterday = (Utc::now() - chrono::Duration::days(1))
            .format("%Y%m%d")
            .to_string();

        assert!(reference.contains(&today) || reference.contains(&yesterday));
    }

    #[test]
    fn custom_prefix_is_used() {
        let generator = ReferenceGenerator::new("ACME");
        let reference = generator.generate();

        assert!(reference.starts_with("ACME_"));
        assert!(generator.is_well_formed(&reference));
        assert!(!ReferenceGenerator::default().is_well_formed(&reference));
    }

    #[test]
    fn ten_thousand_references_are_unique() {
        let generator = ReferenceGenerator::default();
        let references: HashSet<String> = (0..10_000).map(|_| generator.generate()).collect();

        assert_eq!(references.len(), 10_000);
    }

    #[test]
    fn rejects_malformed_references() {
        let generator = ReferenceGenerator::default();

        assert!(!generator.is_well_formed(""));
        assert!(!generator.is_well_formed("LSUC_20240315"));
        assert!(!generator.is_well_formed("LSUC_2024031_3FA94C0B1D2E"));
        assert!(!generator.is_well_formed("LSUC_20240315_3fa94c0b1d2e"));
        assert!(!generator.is_well_formed("LSUC_20240315_3FA94C0B1D2"));
        assert!(!generator.is_well_formed("XSUC_20240315_3FA94C0B1D2E"));
        assert!(generator.is_well_formed("LSUC_20240315_3FA94C0B1D2E"));
    }
}
