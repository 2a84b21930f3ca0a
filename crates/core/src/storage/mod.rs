pub mod gateway;
pub mod keys;
pub mod store;
