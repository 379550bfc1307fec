pub mod config;
pub mod random;

// Per-frame geometry
pub mod pose_metrics;
pub mod hit_tester;

// Games and the triggers that drive them
pub mod exercise;
pub mod game_state;
pub mod moving_average;
pub mod angle_classifier;
pub mod inflation;
pub mod trigger;

// Output: speech and overlays
pub mod announcer;
pub mod feedback_channel;
pub mod overlay;

pub mod session_loop;
