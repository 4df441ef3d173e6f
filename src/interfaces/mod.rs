pub mod bot;
pub mod csv;
