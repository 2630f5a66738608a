mod client;
mod input;
mod terminal;
mod ui;

pub use client::run;
