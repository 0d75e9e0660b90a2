pub mod device_service;
pub mod gateway;
pub mod token;
