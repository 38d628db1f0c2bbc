pub mod event;
pub mod level;
pub mod score;
pub mod session;
pub mod step;
pub mod world;
