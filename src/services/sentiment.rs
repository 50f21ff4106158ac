use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classifier_models::LinearTextModel;
use crate::services::preprocessor::tokenize;

pub const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "wonderful", "fantastic",
    "happy", "satisfied", "love", "awesome", "perfect", "best",
    "thank", "thanks", "appreciate", "helpful", "fixed", "solved",
];

pub const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "awful", "terrible", "horrible", "hate", "angry",
    "frustrated", "disappointed", "broken", "crash", "error", "problem",
    "issue", "trouble", "worst", "useless", "waste", "fail",
];

const POSITIVE_THRESHOLD: f64 = 0.6;
const NEGATIVE_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn to_str(&self) -> &str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positive" => Some(SentimentLabel::Positive),
            "neutral" => Some(SentimentLabel::Neutral),
            "negative" => Some(SentimentLabel::Negative),
            _ => None,
        }
    }

    pub fn from_score(score: f64) -> Self {
        if score > POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if score < NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SentimentResult {
    pub score: f64,
    pub label: SentimentLabel,
}

impl SentimentResult {
    pub fn neutral() -> Self {
        SentimentResult {
            score: 0.5,
            label: SentimentLabel::Neutral,
        }
    }
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Anything that can score the sentiment of free text. The ticket flow holds
/// one of these behind an `Arc` and does not care which variant it got.
pub trait SentimentScorer: Send + Sync + Debug {
    fn analyze(&self, text: &str) -> SentimentResult;

    fn name(&self) -> &'static str;
}

/// Word-list scorer. Always available and used whenever a trained model
/// cannot answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl SentimentScorer for HeuristicScorer {
    fn analyze(&self, text: &str) -> SentimentResult {
        if text.is_empty() {
            return SentimentResult::neutral();
        }

        let tokens = tokenize(text);
        if tokens.is_empty() {
            return SentimentResult::neutral();
        }

        let positive = tokens
            .iter()
            .filter(|token| POSITIVE_WORDS.contains(&token.as_str()))
            .count();
        let negative = tokens
            .iter()
            .filter(|token| NEGATIVE_WORDS.contains(&token.as_str()))
            .count();

        let raw = (positive as f64 - negative as f64) / tokens.len() as f64;
        let score = round3(((raw + 1.0) / 2.0).clamp(0.0, 1.0));

        SentimentResult {
            score,
            label: SentimentLabel::from_score(score),
        }
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// Model-backed scorer. Its score is the winning class's confidence, so a
/// confident negative scores high; the label, not the score, carries polarity.
#[derive(Debug)]
pub struct TrainedScorer {
    model: LinearTextModel,
    fallback: HeuristicScorer,
}

impl TrainedScorer {
    pub fn new(model: LinearTextModel) -> Self {
        Self {
            model,
            fallback: HeuristicScorer,
        }
    }
}

impl SentimentScorer for TrainedScorer {
    fn analyze(&self, text: &str) -> SentimentResult {
        if text.is_empty() {
            return SentimentResult::neutral();
        }

        match self.model.predict(text) {
            Some(prediction) => match SentimentLabel::from_label(&prediction.label) {
                Some(label) => SentimentResult {
                    score: round3(prediction.confidence),
                    label,
                },
                None => {
                    tracing::warn!(
                        "Sentiment model produced unknown label '{}', using heuristic",
                        prediction.label
                    );
                    self.fallback.analyze(text)
                }
            },
            None => self.fallback.analyze(text),
        }
    }

    fn name(&self) -> &'static str {
        "trained"
    }
}

/// Picks the trained scorer when a model path is configured and loads,
/// otherwise the heuristic.
pub fn load_scorer(model_path: Option<&str>) -> Arc<dyn SentimentScorer> {
    let Some(path) = model_path else {
        return Arc::new(HeuristicScorer);
    };

    match LinearTextModel::load(path) {
        Ok(model) => {
            tracing::info!("Loaded sentiment model from {}", path);
            Arc::new(TrainedScorer::new(model))
        }
        Err(e) => {
            tracing::warn!("Failed to load sentiment model from {}: {}. Using heuristic.", path, e);
            Arc::new(HeuristicScorer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier_models::tests::SENTIMENT_MODEL;

    #[test]
    fn empty_text_is_neutral() {
        assert_eq!(HeuristicScorer.analyze(""), SentimentResult::neutral());
        assert_eq!(HeuristicScorer.analyze("!!! 42 ???"), SentimentResult::neutral());
    }

    #[test]
    fn positive_text_scores_high() {
        let result = HeuristicScorer.analyze("Thanks, great support, problem solved");
        // 5 tokens, 3 positive, 1 negative -> raw 0.4 -> 0.7
        assert_eq!(result.score, 0.7);
        assert_eq!(result.label, SentimentLabel::Positive);
    }

    #[test]
    fn negative_text_scores_low() {
        let result = HeuristicScorer.analyze("Terrible app, constant crash and error");
        // tokens: terrible app constant crash and error -> 3 negative of 6
        assert_eq!(result.score, 0.25);
        assert_eq!(result.label, SentimentLabel::Negative);
    }

    #[test]
    fn score_is_rounded_to_three_decimals() {
        let result = HeuristicScorer.analyze("good day for a walk");
        // 1 positive of 5 tokens -> (0.2 + 1) / 2 = 0.6 -> neutral, not positive
        assert_eq!(result.score, 0.6);
        assert_eq!(result.label, SentimentLabel::Neutral);

        let result = HeuristicScorer.analyze("good one two");
        // (1/3 + 1) / 2 = 0.6666.. -> 0.667
        assert_eq!(result.score, 0.667);
        assert_eq!(result.label, SentimentLabel::Positive);
    }

    #[test]
    fn matching_is_exact_token_not_stem() {
        let result = HeuristicScorer.analyze("crashed crashing errors");
        assert_eq!(result.score, 0.5);
        assert_eq!(result.label, SentimentLabel::Neutral);
    }

    #[test]
    fn label_is_consistent_with_score_for_all_inputs() {
        let samples = [
            "",
            "bad bad bad",
            "good good good",
            "awful but helpful",
            "The app crashed and I lost all my data, this is urgent!!",
            "thanks thanks problem",
            "neutral words only here",
        ];
        for sample in samples {
            let result = HeuristicScorer.analyze(sample);
            assert!((0.0..=1.0).contains(&result.score));
            assert_eq!(result.label == SentimentLabel::Positive, result.score > 0.6);
            assert_eq!(result.label == SentimentLabel::Negative, result.score < 0.4);
        }
    }

    #[test]
    fn trained_scorer_uses_model_then_falls_back() {
        let scorer = TrainedScorer::new(LinearTextModel::from_json(SENTIMENT_MODEL).unwrap());

        let result = scorer.analyze("I love it");
        assert_eq!(result.label, SentimentLabel::Positive);
        assert_eq!(result.score, round3(result.score));

        // No vocabulary hit: same answer as the heuristic
        let text = "terrible awful experience";
        assert_eq!(scorer.analyze(text), HeuristicScorer.analyze(text));
        assert_eq!(scorer.analyze(""), SentimentResult::neutral());
    }

    #[test]
    fn trained_score_is_model_confidence() {
        let model = LinearTextModel::from_json(SENTIMENT_MODEL).unwrap();
        let confidence = model.predict("where is my refund").unwrap().confidence;
        let scorer = TrainedScorer::new(model);

        let result = scorer.analyze("where is my refund");
        assert_eq!(result.label, SentimentLabel::Negative);
        assert_eq!(result.score, round3(confidence));
        assert!(result.score > 0.6);
    }

    #[test]
    fn load_scorer_without_model_is_heuristic() {
        assert_eq!(load_scorer(None).name(), "heuristic");
        assert_eq!(load_scorer(Some("/nonexistent/sentiment.json")).name(), "heuristic");
    }
}
