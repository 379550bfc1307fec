// Data models for pose tracking, game state, spoken feedback and overlays

pub mod pose;
pub mod game;
pub mod feedback;
pub mod render;
