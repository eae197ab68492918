use anyhow::{anyhow, Result};
use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::types::ColorTag;

/// Matches a currency-prefixed amount written as `1.234,56`.
pub const DEFAULT_MONEY_PATTERN: &str = r"(?:R\$|US\$|\$|€)\s*(\d+(?:\.\d{3})*,\d{2})";

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Selector lists and limits that decide what counts as each element kind.
/// Loaded from the `[analyzer]` table of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationPolicy {
    pub scarcity: ScarcityRule,
    pub hero: HeroRule,
    pub video: VideoRule,
    pub cta: CtaRule,
    pub money_pattern: String,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            scarcity: ScarcityRule::default(),
            hero: HeroRule::default(),
            video: VideoRule::default(),
            cta: CtaRule::default(),
            money_pattern: DEFAULT_MONEY_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScarcityRule {
    pub selectors: Vec<String>,
    /// Text must be strictly longer than this.
    pub min_chars: usize,
    pub max_chars: usize,
    pub color: ColorTag,
}

impl Default for ScarcityRule {
    fn default() -> Self {
        Self {
            selectors: strings(&[
                "[class*=\"scarcity\"]",
                "[class*=\"countdown\"]",
                "[class*=\"urgency\"]",
                ".bg-red-600",
                ".bg-red-500",
            ]),
            min_chars: 5,
            max_chars: 50,
            color: ColorTag::Red,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroRule {
    pub selectors: Vec<String>,
    /// Tag names accepted as the sub-heading right after the hero.
    pub sub_tags: Vec<String>,
    pub sub_max_chars: usize,
    pub color: ColorTag,
}

impl Default for HeroRule {
    fn default() -> Self {
        Self {
            selectors: strings(&["h1"]),
            sub_tags: strings(&["p", "h2", "h3", "h4"]),
            sub_max_chars: 60,
            color: ColorTag::Purple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoRule {
    pub selectors: Vec<String>,
    pub label: String,
    pub color: ColorTag,
}

impl Default for VideoRule {
    fn default() -> Self {
        Self {
            selectors: strings(&[
                "video",
                "iframe[src*=\"youtube\"]",
                "iframe[src*=\"vimeo\"]",
                "iframe[src*=\"pandavideo\"]",
                "iframe[src*=\"vturb\"]",
                ".aspect-video",
            ]),
            label: "VSL Video Player".to_string(),
            color: ColorTag::Blue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtaRule {
    pub selectors: Vec<String>,
    pub min_chars: usize,
    pub max_chars: usize,
    /// Candidates whose text contains any of these are not offers.
    pub reject_markers: Vec<String>,
    /// Class fragments that mark an anchor as a CTA even with an internal href.
    pub class_markers: Vec<String>,
    pub color: ColorTag,
}

impl Default for CtaRule {
    fn default() -> Self {
        Self {
            selectors: strings(&[
                "button",
                "a[href*=\"checkout\"]",
                "a[href*=\"pay\"]",
                "a[href*=\"mercadopago\"]",
                "[class*=\"cta\"]",
                "[class*=\"checkout\"]",
                "[class*=\"pulse\"]",
            ]),
            min_chars: 3,
            max_chars: 40,
            reject_markers: strings(&["Admin", "Login"]),
            class_markers: strings(&["cta", "checkout", "pulse"]),
            color: ColorTag::Green,
        }
    }
}

/// Parsed form of a policy, ready for traversal.
pub struct CompiledPolicy {
    pub(crate) scarcity: Vec<Selector>,
    pub(crate) hero: Vec<Selector>,
    pub(crate) video: Vec<Selector>,
    /// All CTA selectors as one group so matches come back in document order.
    pub(crate) cta: Selector,
    pub(crate) money: Regex,
    pub(crate) rules: ClassificationPolicy,
}

impl ClassificationPolicy {
    pub fn compile(&self) -> Result<CompiledPolicy> {
        if self.cta.selectors.is_empty() {
            return Err(anyhow!("cta selector list is empty"));
        }
        let money = Regex::new(&self.money_pattern)
            .map_err(|e| anyhow!("invalid money pattern `{}`: {}", self.money_pattern, e))?;
        if money.captures_len() < 2 {
            return Err(anyhow!("money pattern must capture the amount: {}", self.money_pattern));
        }
        Ok(CompiledPolicy {
            scarcity: parse_all(&self.scarcity.selectors)?,
            hero: parse_all(&self.hero.selectors)?,
            video: parse_all(&self.video.selectors)?,
            cta: parse_one(&self.cta.selectors.join(", "))?,
            money,
            rules: self.clone(),
        })
    }
}

fn parse_one(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector `{}`: {:?}", css, e))
}

fn parse_all(list: &[String]) -> Result<Vec<Selector>> {
    list.iter().map(|s| parse_one(s)).collect()
}
