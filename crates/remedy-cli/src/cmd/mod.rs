pub mod actions;
pub mod config;
pub mod normalize;
pub mod serve;
