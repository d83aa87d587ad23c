pub mod audit;
pub mod builds;
pub mod health;
pub mod root;
