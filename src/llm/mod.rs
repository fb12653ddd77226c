pub mod client;
pub mod gateway;
pub mod parsing;
pub mod prompts;
pub mod schema;
pub mod stub;
pub mod validation;

pub use client::*;
pub use gateway::*;
pub use prompts::*;
pub use schema::ResponseSchema;
pub use stub::*;
pub use validation::*;
