pub mod alphabet;
pub mod align;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod io;
pub mod model;
pub mod tree;
pub mod utils;
