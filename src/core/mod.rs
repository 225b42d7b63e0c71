pub mod persistence;
pub mod session;
pub mod store;
