pub mod editor;
pub mod export;
pub mod library;
pub mod reader;
