pub mod gateway;
pub mod onboard;
