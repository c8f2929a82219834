pub mod approval;
pub mod budget;
pub mod cart;
pub mod order;
pub mod pricing;
pub mod role;
pub mod session;

pub use approval::*;
pub use budget::*;
pub use cart::*;
pub use order::*;
pub use pricing::*;
pub use role::*;
pub use session::*;
