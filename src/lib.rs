pub mod config;
pub mod model;
pub mod path;
pub mod sampling;
pub mod scheduler;
pub mod smoothing;
pub mod state;
pub mod transport;
