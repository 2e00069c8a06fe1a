pub mod models;
pub mod orchestration;
pub mod persistence;
pub mod registry;
pub mod strategies;
