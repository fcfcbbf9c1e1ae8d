pub mod cache;
pub mod revocation;
