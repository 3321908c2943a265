//! Route modules for the debug server

pub mod breakpoints;
pub mod health;
