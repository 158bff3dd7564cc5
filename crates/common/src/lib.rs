pub mod money;
pub mod types;
pub mod utils;
