// Pose sources: recorded detector output and synthetic motion

pub mod replay;
pub mod synthetic;

pub use replay::ReplaySource;
pub use synthetic::CurlSimulator;
