//! HTTP request handlers

pub mod assets;
pub mod fib;
pub mod health;
pub mod hello;
pub mod lookup;
pub mod metrics;
pub mod stress;
