pub mod friendship;
pub mod identity;
