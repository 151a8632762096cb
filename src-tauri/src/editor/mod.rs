pub mod history;
pub mod layout;
pub mod parser;
pub mod shortcuts;
pub mod store;

pub use store::{EditorAction, EditorStore};
