pub mod activity;
pub mod batch;
pub mod health;
