mod app;
pub mod logging;

pub use app::run;
