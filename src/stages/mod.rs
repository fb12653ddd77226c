pub mod stage1_extract;
pub mod stage2_assess;
pub mod stage3_route;

pub use stage1_extract::*;
pub use stage2_assess::*;
pub use stage3_route::*;
