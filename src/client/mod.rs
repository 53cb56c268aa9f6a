pub mod gateway;

pub use gateway::{CheckoutClient, GatewaySimulator};
