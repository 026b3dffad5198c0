pub mod actor;
pub mod camera;
pub mod constants;
pub mod engine;
pub mod error;
pub mod grid;
pub mod pathfinding;
pub mod rng;
pub mod session;
pub mod spatial;
pub mod types;
pub mod world;
