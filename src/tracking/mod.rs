pub mod enrich;
pub mod normalize;
pub mod progress;
pub mod render;
pub mod service;
