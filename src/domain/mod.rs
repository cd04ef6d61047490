pub mod camera;
pub mod entity;
pub mod geometry;
pub mod physics;
pub mod tile;
