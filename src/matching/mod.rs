//! Team split search
//!
//! Both finders are pure queries: they read ratings or lane data and return
//! proposals without touching any store.

pub mod balanced;
pub mod combinatorics;
pub mod lane;
pub mod top_k;

pub use balanced::{pool_size, BalancedMatchFinder};
pub use lane::{lane_variance, match_strength, LaneMatchFinder};
pub use top_k::BoundedTopK;
