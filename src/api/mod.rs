pub mod procurement_api;

pub use procurement_api::*;
