pub mod chat;
pub mod controller;
pub mod factory;

pub use factory::ClientFactory;
