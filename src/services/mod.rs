pub mod mood_stats;
pub mod qalbu;
pub mod tracker;
