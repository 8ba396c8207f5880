//! Tehai analysis facade
//!
//! Request/response records over tehai-engine: tenpai and hand-value
//! analysis, discard tables, and parallel batch analysis.

pub mod analysis;
pub mod batch;
pub mod discard;

pub use analysis::{
    analyze_hand_value, analyze_tenpai, respond_hand_value, respond_tenpai, ApiResponse,
    HandAnalysisRequest, TenpaiReport, TenpaiRequest, TenpaiStatus,
};
pub use batch::BatchAnalyzer;
pub use discard::{analyze_discards, DiscardOption};
