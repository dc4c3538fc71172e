pub mod app;
pub mod interactive;
pub mod model;
pub mod payload;
