pub mod animation;
pub mod movement;
pub mod network;
pub mod player;
pub mod preferences;
pub mod world;
