// src/aggregate/relevance.rs
//! Query relevance: the strict all-terms filter (default) and the weighted scorer.
//!
//! Weighted score per listing:
//! `similarity_weight * sequence_similarity(name, query) + term_weight * term_match_score`
//! where `term_match_score = (2 * exact + partial) / (2 * terms)`. Category rules then
//! boost names carrying a keyword implied by the query and penalize accessory noise.
//! The result is clamped to [0, 1].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strsim::normalized_levenshtein;

use crate::listing::Listing;

const PARTIAL_MIN_WORD: usize = 3;
const PARTIAL_SIMILARITY: f64 = 0.75;

/// Boost/penalty rule that applies when the query names a product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    /// Query tokens (matched by prefix) that activate this rule.
    pub triggers: Vec<String>,
    #[serde(default)]
    pub boost_keywords: Vec<String>,
    #[serde(default = "default_boost")]
    pub boost: f32,
    #[serde(default)]
    pub penalty_keywords: Vec<String>,
    #[serde(default = "default_penalty")]
    pub penalty: f32,
}

fn default_boost() -> f32 {
    0.2
}

fn default_penalty() -> f32 {
    0.3
}

impl CategoryRule {
    pub fn gpu() -> Self {
        let words = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            name: "gpu".into(),
            triggers: words(&["rtx", "gtx", "rx", "graphics", "gpu", "vga"]),
            boost_keywords: words(&[
                "rtx", "gtx", "rx", "graphics", "gpu", "vga", "geforce", "radeon",
            ]),
            boost: default_boost(),
            penalty_keywords: words(&[
                "thermal pad",
                "thermal paste",
                "cable",
                "screw",
                "bracket",
                "case",
                "power supply",
                "psu",
                "cooling",
                "fan",
                "rgb",
                "keyboard",
                "mouse",
                "monitor",
                "speaker",
                "headset",
                "chair",
                "desk",
                "webcam",
                "microphone",
            ]),
            penalty: default_penalty(),
        }
    }

    fn triggered_by(&self, terms: &[String]) -> bool {
        terms
            .iter()
            .any(|t| self.triggers.iter().any(|tr| t.starts_with(tr.as_str())))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub min_score: f32,
    pub similarity_weight: f32,
    pub term_weight: f32,
    pub categories: Vec<CategoryRule>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_score: 0.3,
            similarity_weight: 0.3,
            term_weight: 0.7,
            categories: vec![CategoryRule::gpu()],
        }
    }
}

/// Which relevance filter a search uses. `AllTerms` unless scoring is configured.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RelevancePolicy {
    #[default]
    AllTerms,
    Weighted(ScoringConfig),
}

/// Lowercase whitespace-separated query terms.
pub fn query_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// True when the lowercased name contains every term as a substring.
pub fn matches_all_terms(name: &str, terms: &[String]) -> bool {
    let name = name.to_lowercase();
    terms.iter().all(|t| name.contains(t.as_str()))
}

/// Keep listings whose name contains every query term. A blank query keeps everything.
pub fn filter_all_terms(listings: Vec<Listing>, query: &str) -> Vec<Listing> {
    let terms = query_terms(query);
    listings
        .into_iter()
        .filter(|l| matches_all_terms(&l.name, &terms))
        .collect()
}

pub fn sequence_similarity(a: &str, b: &str) -> f32 {
    normalized_levenshtein(a, b) as f32
}

/// `(2 * exact + partial) / (2 * terms)` over lowercased inputs.
pub fn term_match_score(name_lower: &str, terms: &[String]) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let words: Vec<&str> = name_lower.split_whitespace().collect();
    let mut exact = 0usize;
    let mut partial = 0usize;
    for t in terms {
        if name_lower.contains(t.as_str()) {
            exact += 1;
        } else if words.iter().any(|w| {
            w.chars().count() >= PARTIAL_MIN_WORD
                && (t.contains(w) || normalized_levenshtein(t, w) >= PARTIAL_SIMILARITY)
        }) {
            partial += 1;
        }
    }
    (2 * exact + partial) as f32 / (2 * terms.len()) as f32
}

pub fn relevance_score(name: &str, query: &str, cfg: &ScoringConfig) -> f32 {
    let name_lower = name.trim().to_lowercase();
    let query_lower = query.trim().to_lowercase();
    let terms = query_terms(&query_lower);
    if terms.is_empty() {
        return 0.0;
    }

    let mut score = cfg.similarity_weight * sequence_similarity(&name_lower, &query_lower)
        + cfg.term_weight * term_match_score(&name_lower, &terms);

    for rule in cfg.categories.iter().filter(|r| r.triggered_by(&terms)) {
        if rule.boost_keywords.iter().any(|k| name_lower.contains(k.as_str())) {
            score += rule.boost;
        }
        if rule.penalty_keywords.iter().any(|k| name_lower.contains(k.as_str())) {
            score -= rule.penalty;
        }
    }
    score.clamp(0.0, 1.0)
}

/// Score, drop below `min_score`, order by (score desc, price asc).
pub fn score_and_filter(listings: Vec<Listing>, query: &str, cfg: &ScoringConfig) -> Vec<Listing> {
    let mut kept: Vec<Listing> = listings
        .into_iter()
        .filter_map(|mut l| {
            let s = relevance_score(&l.name, query, cfg);
            l.relevance = Some(s);
            (s >= cfg.min_score).then_some(l)
        })
        .collect();
    kept.sort_by(by_score_then_price);
    kept
}

pub(crate) fn by_score_then_price(a: &Listing, b: &Listing) -> Ordering {
    let sa = a.relevance.unwrap_or(0.0);
    let sb = b.relevance.unwrap_or(0.0);
    sb.partial_cmp(&sa)
        .unwrap_or(Ordering::Equal)
        .then(a.price.cmp(&b.price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Availability;

    fn l(name: &str, price: u64) -> Listing {
        Listing {
            name: name.into(),
            url: String::new(),
            price,
            store: "S".into(),
            availability: Availability::Unknown,
            relevance: None,
        }
    }

    #[test]
    fn all_terms_is_substring_and_case_insensitive() {
        let terms = query_terms("RTX 4070");
        assert!(matches_all_terms("MSI GeForce RTX 4070 Ventus", &terms));
        assert!(matches_all_terms("rtx4070 super", &terms));
        assert!(!matches_all_terms("RTX 4060", &terms));
    }

    #[test]
    fn term_score_counts_exact_and_partial() {
        let terms = query_terms("4070super rtx");
        // "rtx" exact; "super" is a word inside "4070super" -> partial.
        let s = term_match_score("rtx 4070 super", &terms);
        assert!((s - 0.75).abs() < 1e-6, "got {s}");
    }

    #[test]
    fn gpu_boost_and_accessory_penalty() {
        let cfg = ScoringConfig::default();
        let card = relevance_score("GeForce RTX 4070 12GB", "rtx 4070", &cfg);
        let pad = relevance_score("RTX 4070 thermal pad kit", "rtx 4070", &cfg);
        assert!(card > pad, "card={card} pad={pad}");
        assert!((0.0..=1.0).contains(&card));
    }

    #[test]
    fn non_gpu_queries_skip_category_rules() {
        let cfg = ScoringConfig::default();
        let with_rules = relevance_score("DDR4 RAM cable", "ddr4 ram", &cfg);
        let no_rules = ScoringConfig {
            categories: vec![],
            ..ScoringConfig::default()
        };
        assert_eq!(with_rules, relevance_score("DDR4 RAM cable", "ddr4 ram", &no_rules));
    }

    #[test]
    fn weighted_orders_by_score_then_price() {
        let cfg = ScoringConfig::default();
        let out = score_and_filter(
            vec![
                l("RTX 4070 Super", 32_000),
                l("RTX 4070 Super", 31_000),
                l("Office chair", 2_000),
            ],
            "rtx 4070 super",
            &cfg,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].price, 31_000);
        assert!(out.iter().all(|x| x.relevance.is_some()));
    }
}
