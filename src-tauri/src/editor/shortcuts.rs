use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Shortcut {
    Undo,
    Redo,
    DeleteSelected,
}

/// キー入力をショートカットに変換（テキスト入力中は無効）
pub fn shortcut_for(key: &str, ctrl: bool, meta: bool, in_text_input: bool) -> Option<Shortcut> {
    if in_text_input {
        return None;
    }
    let command = ctrl || meta;
    match key.to_lowercase().as_str() {
        "z" if command => Some(Shortcut::Undo),
        "y" if command => Some(Shortcut::Redo),
        "delete" | "backspace" if !command => Some(Shortcut::DeleteSelected),
        _ => None,
    }
}
