pub mod editor;
pub mod logging;
pub mod settings;
pub mod stream;
