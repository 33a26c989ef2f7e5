pub mod relay_service;
pub mod upstream;
