pub mod location;
pub mod normalize;
pub mod orchestrator;
pub mod owm;
