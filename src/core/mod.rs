pub mod game;
pub mod ports;
