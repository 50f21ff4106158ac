// Text heuristics used to enrich tickets: cleaning, sentiment, priority, keywords.
pub mod preprocessor;
pub mod priority;
pub mod sentiment;
