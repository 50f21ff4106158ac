use crate::classifier_models::LinearTextModel;
use crate::models::ticketmodel::TicketPriority;
use crate::services::preprocessor::clean_text;

/// Checked as substrings of the cleaned text, in this (lexicographic) order.
pub const URGENT_KEYWORDS: &[&str] = &[
    "account locked", "asap", "broken", "crash", "critical", "data loss",
    "down", "emergency", "error", "failed", "immediately", "not working",
    "severe", "urgent",
];

pub const HIGH_KEYWORDS: &[&str] = &[
    "business", "customer", "impact", "important", "issue", "problem",
    "revenue", "significant", "urgent",
];

/// First keyword that fires, with the tier it maps to.
pub fn matched_keyword(text: &str) -> Option<(&'static str, TicketPriority)> {
    let cleaned = clean_text(text);

    URGENT_KEYWORDS
        .iter()
        .find(|keyword| cleaned.contains(*keyword))
        .map(|keyword| (*keyword, TicketPriority::Urgent))
        .or_else(|| {
            HIGH_KEYWORDS
                .iter()
                .find(|keyword| cleaned.contains(*keyword))
                .map(|keyword| (*keyword, TicketPriority::High))
        })
}

/// Keyword triggers first, then the sentiment score decides.
pub fn predict_priority(text: &str, sentiment_score: f64) -> TicketPriority {
    if text.is_empty() {
        return TicketPriority::Medium;
    }

    if let Some((_, priority)) = matched_keyword(text) {
        return priority;
    }

    if sentiment_score < 0.3 {
        TicketPriority::High
    } else if sentiment_score < 0.4 {
        TicketPriority::Medium
    } else {
        TicketPriority::Low
    }
}

#[derive(Debug, Default)]
pub struct PriorityPredictor {
    model: Option<LinearTextModel>,
}

impl PriorityPredictor {
    pub fn heuristic() -> Self {
        Self { model: None }
    }

    pub fn with_model(model: LinearTextModel) -> Self {
        Self { model: Some(model) }
    }

    /// Uses the model at `model_path` when it loads, the keyword rules otherwise.
    pub fn load(model_path: Option<&str>) -> Self {
        let Some(path) = model_path else {
            return Self::heuristic();
        };

        match LinearTextModel::load(path) {
            Ok(model) => {
                tracing::info!("Loaded priority model from {}", path);
                Self::with_model(model)
            }
            Err(e) => {
                tracing::warn!("Failed to load priority model from {}: {}. Using heuristic.", path, e);
                Self::heuristic()
            }
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn predict(&self, text: &str, sentiment_score: f64) -> TicketPriority {
        if text.is_empty() {
            return TicketPriority::Medium;
        }

        if let Some(model) = &self.model {
            if let Some(prediction) = model.predict(text) {
                match TicketPriority::from_label(&prediction.label) {
                    Some(priority) => return priority,
                    None => tracing::warn!(
                        "Priority model produced unknown label '{}', using heuristic",
                        prediction.label
                    ),
                }
            }
        }

        predict_priority(text, sentiment_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_medium_for_any_sentiment() {
        for score in [0.0, 0.1, 0.35, 0.5, 1.0] {
            assert_eq!(predict_priority("", score), TicketPriority::Medium);
            assert_eq!(PriorityPredictor::heuristic().predict("", score), TicketPriority::Medium);
        }
    }

    #[test]
    fn crash_report_is_urgent() {
        let text = "The app crashed and I lost all my data, this is urgent!!";
        assert_eq!(predict_priority(text, 0.5), TicketPriority::Urgent);
        assert_eq!(matched_keyword(text), Some(("crash", TicketPriority::Urgent)));
    }

    #[test]
    fn multi_word_keywords_match_across_punctuation() {
        assert_eq!(
            matched_keyword("My ACCOUNT -- locked since Monday"),
            Some(("account locked", TicketPriority::Urgent))
        );
        assert_eq!(predict_priority("Checkout is NOT working!!", 0.9), TicketPriority::Urgent);
    }

    #[test]
    fn high_keywords_apply_when_no_urgent_match() {
        assert_eq!(
            predict_priority("This has a big impact on our revenue", 0.9),
            TicketPriority::High
        );
        assert_eq!(
            matched_keyword("our business needs this"),
            Some(("business", TicketPriority::High))
        );
    }

    #[test]
    fn substring_match_is_not_token_exact() {
        // "download" contains "down"
        assert_eq!(predict_priority("Where can I download invoices", 0.9), TicketPriority::Urgent);
    }

    #[test]
    fn sentiment_decides_without_keywords() {
        let text = "How do I change my avatar";
        assert_eq!(predict_priority(text, 0.2), TicketPriority::High);
        assert_eq!(predict_priority(text, 0.35), TicketPriority::Medium);
        assert_eq!(predict_priority(text, 0.4), TicketPriority::Low);
        assert_eq!(predict_priority(text, 0.5), TicketPriority::Low);
    }

    #[test]
    fn trained_predictor_prefers_model_then_rules() {
        let model = LinearTextModel::from_json(
            r#"{
                "labels": ["low", "medium", "high", "urgent"],
                "bias": [0.0, 0.0, 0.0, 0.0],
                "weights": { "invoice": [0.0, 3.0, 0.0, 0.0] }
            }"#,
        )
        .unwrap();
        let predictor = PriorityPredictor::with_model(model);
        assert!(predictor.is_trained());

        // model overrides the "crash" keyword
        assert_eq!(predictor.predict("invoice crash", 0.5), TicketPriority::Medium);
        // out of vocabulary: keyword rules
        assert_eq!(predictor.predict("server crash", 0.5), TicketPriority::Urgent);
    }

    #[test]
    fn load_without_model_is_heuristic() {
        assert!(!PriorityPredictor::load(None).is_trained());
        assert!(!PriorityPredictor::load(Some("/nonexistent/priority.json")).is_trained());
    }
}
