//! Cross-validation
//!
//! Fold plans, the parallel prediction engine and grid search built on it.

pub mod engine;
pub mod folds;
pub mod search;

pub use self::engine::{
    cross_val_predict, CrossValidation, FoldStatus, FoldSummary, LogProgress, NoProgress,
    ProgressObserver,
};
pub use self::folds::{FoldAssignment, FoldPlan, LeaveOneOut, StratifiedKFold};
pub use self::search::{CandidateScore, GridSearch, GridSearchResult, ParameterGrid};
