pub mod clock;
pub mod controller;
pub mod history;
pub mod snapshot;
