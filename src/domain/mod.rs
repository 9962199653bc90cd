pub mod entity;
pub mod physics;
