mod style;
mod editor;
mod library;
mod reader;
mod export;

pub use style::*;
pub use editor::*;
pub use library::*;
pub use reader::*;
pub use export::ExportSummary;
