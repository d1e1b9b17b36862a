pub mod gateway;
pub mod mock;
pub mod signature;
pub mod stripe;
