//! Entity storage and the world context

pub mod store;
pub mod world;

pub use store::{EntityStore, Harvest};
pub use world::World;
