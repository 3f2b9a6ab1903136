//! Niche scoring, threshold filtering and ranking.

use serde::{Deserialize, Deserializer, Serialize};

/// Scored keyword candidate. Scores are normalised to roughly 0..=1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NicheScore {
    pub keyword: String,
    pub payout_score: f64,
    pub urgency_score: f64,
    pub evergreen_score: f64,
    pub search_volume_score: f64,
}

impl NicheScore {
    pub fn total(&self) -> f64 {
        self.payout_score * 0.35
            + self.urgency_score * 0.25
            + self.evergreen_score * 0.2
            + self.search_volume_score * 0.2
    }
}

/// Strategy turning a keyword into a score. Swap in a trends/SEO backed
/// implementation without touching the ranking code.
pub trait KeywordScorer {
    fn score(&self, keyword: &str) -> NicheScore;
}

/// Deterministic stand-in derived from keyword length.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderScorer;

impl KeywordScorer for PlaceholderScorer {
    fn score(&self, keyword: &str) -> NicheScore {
        let baseline = (keyword.chars().count() % 10) as f64 / 10.0;
        NicheScore {
            keyword: keyword.to_string(),
            payout_score: baseline + 0.3,
            urgency_score: baseline + 0.2,
            evergreen_score: baseline + 0.1,
            search_volume_score: baseline + 0.2,
        }
    }
}

/// Score every keyword and keep the `top_n` best, highest total first.
/// Equal totals keep their input order.
pub fn prioritize_niches<S, I>(scorer: &S, keywords: I, top_n: usize) -> Vec<NicheScore>
where
    S: KeywordScorer + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut scores = keywords
        .into_iter()
        .map(|keyword| scorer.score(keyword.as_ref()))
        .collect::<Vec<_>>();
    scores.sort_by(|a, b| b.total().total_cmp(&a.total()));
    scores.truncate(top_n);
    scores
}

/// Niche as listed in a pipeline config file. Missing numbers read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheIdea {
    pub topic: String,
    #[serde(default)]
    pub affiliate_payout: f64,
    #[serde(default)]
    pub urgent_intent_score: f64,
    #[serde(default)]
    pub evergreen_score: f64,
    #[serde(default, deserialize_with = "whole_number")]
    pub search_volume: u64,
}

/// Accept `1500` or `1500.0`; fractions truncate and negatives clamp to zero.
fn whole_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.trunc() as u64)
}

impl NicheIdea {
    pub fn rank_score(&self) -> f64 {
        self.affiliate_payout * 0.3
            + self.urgent_intent_score * 30.0
            + self.evergreen_score * 20.0
            + (self.search_volume as f64 / 1000.0) * 0.4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NicheCriteria {
    pub min_affiliate_payout: f64,
    pub min_urgent_intent_score: f64,
    pub min_evergreen_score: f64,
    pub min_search_volume: u64,
}

impl Default for NicheCriteria {
    fn default() -> Self {
        Self {
            min_affiliate_payout: 20.0,
            min_urgent_intent_score: 0.6,
            min_evergreen_score: 0.5,
            min_search_volume: 1000,
        }
    }
}

impl NicheCriteria {
    pub fn accepts(&self, niche: &NicheIdea) -> bool {
        niche.affiliate_payout >= self.min_affiliate_payout
            && niche.urgent_intent_score >= self.min_urgent_intent_score
            && niche.evergreen_score >= self.min_evergreen_score
            && niche.search_volume >= self.min_search_volume
    }
}

pub fn filter_niches<I>(niches: I, criteria: &NicheCriteria) -> Vec<NicheIdea>
where
    I: IntoIterator<Item = NicheIdea>,
{
    niches
        .into_iter()
        .filter(|niche| criteria.accepts(niche))
        .collect()
}

/// Order niches by [`NicheIdea::rank_score`], best first, ties stable.
pub fn rank_niches(mut niches: Vec<NicheIdea>) -> Vec<NicheIdea> {
    niches.sort_by(|a, b| b.rank_score().total_cmp(&a.rank_score()));
    niches
}
