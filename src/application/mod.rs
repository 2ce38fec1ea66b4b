//! Application services layer.

pub mod catalog;
pub mod error;
pub mod index;
pub mod pagination;
pub mod query;
