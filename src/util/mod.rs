pub mod dates;
pub mod query;
