//! SVM solver implementations
//!
//! The binary C-SVC dual is solved with Sequential Minimal Optimization.

pub mod smo;

pub use self::smo::*;
