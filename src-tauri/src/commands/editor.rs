use std::collections::BTreeMap;
use std::path::Path;
use serde::Serialize;
use tauri::State;

use crate::constants::{EDITOR_STORE_KEY, PAGE_IMAGE_EXTENSIONS};
use crate::editor::parser::parse_raw_text;
use crate::editor::shortcuts::{shortcut_for, Shortcut};
use crate::editor::{EditorAction, EditorStore};
use crate::image_utils::{extension_of, validate_dimensions};
use crate::state::{lock, AppState};
use crate::types::{EditorState, NewPage};

/// フロントエンドに返すエディタ状態
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub state: EditorState,
    pub can_undo: bool,
    pub can_redo: bool,
}

fn snapshot(store: &EditorStore) -> EditorSnapshot {
    EditorSnapshot {
        state: store.state().clone(),
        can_undo: store.can_undo(),
        can_redo: store.can_redo(),
    }
}

// 変更後の状態を保存（失敗してもエラーにはしない）
fn persist(state: &AppState, store: &EditorStore) {
    if let Err(e) = state.kv_store.set(EDITOR_STORE_KEY, store.state()) {
        tracing::warn!(error = %e, "エディタ状態の保存に失敗");
    }
}

/// 保存済みのエディタ状態（一覧表示・選択なしで開始）
pub fn load_saved_editor(kv: &crate::library::store::KeyValueStore) -> EditorStore {
    let mut saved: EditorState = kv.get(EDITOR_STORE_KEY);
    saved.reset_view();
    EditorStore::new(saved)
}

#[tauri::command]
pub fn load_editor_state(state: State<'_, AppState>) -> Result<EditorSnapshot, String> {
    let store = lock(&state.editor)?;
    Ok(snapshot(&store))
}

#[tauri::command]
pub fn dispatch_editor_action(
    action: EditorAction,
    state: State<'_, AppState>,
) -> Result<EditorSnapshot, String> {
    let mut store = lock(&state.editor)?;
    store.dispatch(&action).map_err(|e| e.to_string())?;
    persist(&state, &store);
    Ok(snapshot(&store))
}

#[tauri::command]
pub fn undo(state: State<'_, AppState>) -> Result<EditorSnapshot, String> {
    let mut store = lock(&state.editor)?;
    if store.undo() {
        persist(&state, &store);
    }
    Ok(snapshot(&store))
}

#[tauri::command]
pub fn redo(state: State<'_, AppState>) -> Result<EditorSnapshot, String> {
    let mut store = lock(&state.editor)?;
    if store.redo() {
        persist(&state, &store);
    }
    Ok(snapshot(&store))
}

/// キー入力を処理。ショートカットでなければ None。
#[tauri::command]
pub fn handle_shortcut(
    key: String,
    ctrl: bool,
    meta: bool,
    in_text_input: bool,
    state: State<'_, AppState>,
) -> Result<Option<EditorSnapshot>, String> {
    let Some(shortcut) = shortcut_for(&key, ctrl, meta, in_text_input) else {
        return Ok(None);
    };
    let mut store = lock(&state.editor)?;
    let changed = match shortcut {
        Shortcut::Undo => store.undo(),
        Shortcut::Redo => store.redo(),
        Shortcut::DeleteSelected => {
            store.dispatch(&EditorAction::DeleteSelected).map_err(|e| e.to_string())?;
            true
        }
    };
    if changed {
        persist(&state, &store);
    }
    Ok(Some(snapshot(&store)))
}

/// 取り込み前のプレビュー用にスクリプトを解析
#[tauri::command]
pub fn parse_script(raw: String) -> BTreeMap<u32, Vec<String>> {
    parse_raw_text(&raw)
}

// 画像ファイルをページ入力に変換（対応外の拡張子は除外）
fn new_pages(paths: &[String]) -> Result<Vec<NewPage>, String> {
    let mut pages = Vec::new();
    for path_str in paths {
        let path = Path::new(path_str);
        if !PAGE_IMAGE_EXTENSIONS.contains(&extension_of(path).as_str()) {
            tracing::debug!(path = %path.display(), "対応外の画像をスキップ");
            continue;
        }
        let (width, height) = image::image_dimensions(path)
            .map_err(|e| format!("画像読み込みエラー: {} - {}", path.display(), e))?;
        validate_dimensions(width, height)?;
        pages.push(NewPage {
            image_path: path_str.clone(),
            file_name: path.file_name().unwrap_or_default().to_string_lossy().to_string(),
            image_width: width,
            image_height: height,
        });
    }
    // ファイル名で自然順ソート
    pages.sort_by(|a, b| natord::compare(&a.file_name, &b.file_name));
    Ok(pages)
}

#[tauri::command]
pub async fn add_page_files(
    paths: Vec<String>,
    state: State<'_, AppState>,
) -> Result<EditorSnapshot, String> {
    let pages = tokio::task::spawn_blocking(move || new_pages(&paths))
        .await
        .map_err(|e| e.to_string())??;

    let mut store = lock(&state.editor)?;
    if !pages.is_empty() {
        store.dispatch(&EditorAction::AddPages { pages }).map_err(|e| e.to_string())?;
        persist(&state, &store);
    }
    Ok(snapshot(&store))
}
