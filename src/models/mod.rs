pub mod access;
pub mod actor;
pub mod interest;
pub mod opportunity;
pub mod validation;
