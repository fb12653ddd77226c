pub mod assessment;
pub mod batch;
pub mod claim;
pub mod review;
pub mod routing;

pub use assessment::*;
pub use batch::*;
pub use claim::*;
pub use review::*;
pub use routing::*;
