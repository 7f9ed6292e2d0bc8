pub mod confidence;
pub mod discrepancy;
pub mod evaluator;
pub mod outcome;

pub use confidence::Confidence;
pub use discrepancy::{detect, DiscrepancyInfo};
pub use evaluator::{evaluate, Evaluation, MatchedByPolicy, RuleHit, SkippedRule};
pub use outcome::{BatchItem, BatchItemResult, ClassificationResult};
