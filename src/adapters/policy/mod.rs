//! Eligibility policy adapters.

mod allow_all;

pub use allow_all::AllowAllPolicy;
