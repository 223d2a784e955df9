#[macro_use]
extern crate lazy_static;

pub mod actions;
pub mod callbacks;
pub mod error;
pub mod handle;
pub mod queries;
pub mod types;
