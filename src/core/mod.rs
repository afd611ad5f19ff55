pub mod configuration;
pub mod heat_loss;
pub mod house_component;
pub mod material;
pub mod units;
