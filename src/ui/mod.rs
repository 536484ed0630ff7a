pub mod app;
pub mod components;
pub mod form;
pub mod tui;

pub use app::App;
