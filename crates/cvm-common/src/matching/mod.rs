pub mod overlap;
pub mod pipeline;
pub mod scoring;
pub mod weights;

pub use overlap::overlap_ratio;
pub use pipeline::{MatchEngine, MatchEngineConfig};
pub use scoring::{HeuristicEvaluator, MatchResult, ScoreComponents};
pub use weights::{Weights, DEFAULT_WEIGHTS};
