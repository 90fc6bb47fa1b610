pub mod error;
pub mod matched_filter;
pub mod range;
pub mod reconstruct;
pub mod sweep;
