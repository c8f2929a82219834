pub mod approval_service;
pub mod budget_service;
pub mod cart_service;
pub mod order_service;
pub mod pricing_service;
pub mod session_service;

pub use approval_service::*;
pub use cart_service::*;
pub use order_service::*;
pub use session_service::*;
