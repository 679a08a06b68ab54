pub mod postgrest;
pub mod query;
pub mod tables;

pub use postgrest::PostgrestClient;
pub use query::Query;
