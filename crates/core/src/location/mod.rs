pub mod capture;
pub mod provider;
