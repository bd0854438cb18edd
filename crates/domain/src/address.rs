//! Postal addresses.

use serde::{Deserialize, Serialize};

/// A shipping or billing address.
///
/// `region` carries the state/province code used for sales tax lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Address {
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postcode: String,
    pub country: String,
}

impl Address {
    /// Returns the region code lowercased for tax-table lookup, if present.
    pub fn region_code(&self) -> Option<String> {
        self.region
            .as_deref()
            .map(|r| r.trim().to_ascii_lowercase())
            .filter(|r| !r.is_empty())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.line1, self.city, self.country)?;
        if let Some(region) = &self.region {
            write!(f, " ({region})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_code_is_normalized() {
        let address = Address {
            region: Some(" TX ".to_string()),
            ..Address::default()
        };
        assert_eq!(address.region_code(), Some("tx".to_string()));
    }

    #[test]
    fn blank_region_reads_as_absent() {
        let address = Address {
            region: Some("   ".to_string()),
            ..Address::default()
        };
        assert_eq!(address.region_code(), None);
        assert_eq!(Address::default().region_code(), None);
    }
}
