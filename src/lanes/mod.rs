//! Lane strengths and lane-based matchmaking

pub mod store;
pub mod system;

pub use store::{
    format_lane_rating, parse_lane_rating, parse_lane_ratings, validate_lane_strengths,
    LaneRatingStore, MAX_LANE_STRENGTH,
};
pub use system::{LaneMatchmakingSystem, LANE_SAVE_FILE};
