pub mod health;
pub mod opportunity;
