//! Coarse visitor region derived from the requesting hostname.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    /// Brazilian storefront; every unmatched host lands here.
    Default,
    /// English-language storefront priced in dollars.
    International,
}

impl Region {
    pub fn currency(self) -> &'static str {
        match self {
            Region::Default => "BRL",
            Region::International => "USD",
        }
    }

    pub fn key_suffix(self) -> &'static str {
        match self {
            Region::Default => "_br",
            Region::International => "_us",
        }
    }

    pub fn info(self) -> RegionInfo {
        RegionInfo {
            region: self,
            currency: self.currency().to_string(),
            key_suffix: self.key_suffix().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub region: Region,
    pub currency: String,
    pub key_suffix: String,
}

/// Host substring that selects a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRule {
    pub host_contains: String,
    pub region: Region,
}

/// Ordered host table; first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTable {
    rules: Vec<RegionRule>,
}

impl Default for RegionTable {
    fn default() -> Self {
        let rule = |host: &str, region| RegionRule { host_contains: host.to_string(), region };
        Self {
            rules: vec![
                rule("en.metodovsl.com", Region::International),
                rule("metodovsl.us", Region::International),
                rule("international.", Region::International),
            ],
        }
    }
}

impl RegionTable {
    pub fn new(rules: Vec<RegionRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| RegionRule { host_contains: r.host_contains.trim().to_ascii_lowercase(), region: r.region })
            .filter(|r| !r.host_contains.is_empty())
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[RegionRule] { &self.rules }

    /// Total: unknown or empty hosts map to `Region::Default`.
    pub fn classify(&self, hostname: &str) -> RegionInfo {
        let host = hostname.trim().to_ascii_lowercase();
        self.rules
            .iter()
            .find(|r| host.contains(&r.host_contains))
            .map(|r| r.region)
            .unwrap_or(Region::Default)
            .info()
    }
}

/// Classify against the built-in production host table.
pub fn classify_region(hostname: &str) -> RegionInfo {
    RegionTable::default().classify(hostname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_host_is_default() {
        let info = classify_region("localhost:3000");
        assert_eq!(info.region, Region::Default);
        assert_eq!(info.currency, "BRL");
        assert_eq!(info.key_suffix, "_br");
        assert_eq!(classify_region("").region, Region::Default);
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let info = classify_region("EN.MetodoVSL.com");
        assert_eq!(info.region, Region::International);
        assert_eq!(info.currency, "USD");
        assert_eq!(info.key_suffix, "_us");
    }

    #[test]
    fn custom_table_first_rule_wins() {
        let table = RegionTable::new(vec![
            RegionRule { host_contains: " Shop.Example ".into(), region: Region::International },
            RegionRule { host_contains: "example".into(), region: Region::Default },
            RegionRule { host_contains: "   ".into(), region: Region::International },
        ]);
        assert_eq!(table.rules().len(), 2);
        assert_eq!(table.classify("shop.example.com").region, Region::International);
        assert_eq!(table.classify("www.example.com").region, Region::Default);
    }
}
