use std::sync::OnceLock;

use regex::Regex;
use scraper::ElementRef;

use super::policy::DEFAULT_MONEY_PATTERN;
use super::element_text;

fn default_money() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DEFAULT_MONEY_PATTERN).expect("default money pattern is valid"))
}

/// Parse the first `R$ 1.234,56`-style amount in `text`.
pub fn parse_money(text: &str) -> Option<f64> {
    parse_money_with(default_money(), text)
}

pub fn parse_money_with(re: &Regex, text: &str) -> Option<f64> {
    let caps = re.captures(text)?;
    let raw = caps.get(1)?.as_str();
    let plain = raw.replace('.', "").replace(',', ".");
    plain.parse::<f64>().ok().map(round2)
}

/// Price for a CTA: its own text, then its parent's, then its grandparent's.
pub fn extract_value(el: ElementRef<'_>, re: &Regex) -> Option<f64> {
    let parent = el.parent().and_then(ElementRef::wrap);
    let grandparent = parent.and_then(|p| p.parent()).and_then(ElementRef::wrap);
    std::iter::once(Some(el))
        .chain([parent, grandparent])
        .flatten()
        .find_map(|node| parse_money_with(re, &element_text(&node)))
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
