pub mod migrations;
pub mod schema;
pub mod store;

pub use migrations::*;
pub use schema::*;
pub use store::*;
