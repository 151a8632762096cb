use std::path::{Path, PathBuf};
use rayon::prelude::*;
use serde::Serialize;
use tauri::{AppHandle, Emitter, Manager, State};
use walkdir::WalkDir;

use crate::cache::CoverCache;
use crate::constants::{COMIC_EXTENSIONS, EDITOR_STORE_KEY};
use crate::image_utils::{extension_of, to_data_url};
use crate::library::{self, Library};
use crate::reader;
use crate::state::{lock, AppState};
use crate::thumbnail::extract_cover;
use crate::types::{ComicBook, FileValidationResult, Folder, FolderContents, LibraryData};

/// 表紙生成完了イベント
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CoverReady {
    comic_id: String,
    cover_path: String,
}

pub(crate) fn save_library(state: &AppState, library: &Library) -> Result<(), String> {
    state.library_store.save(library.data()).map_err(|e| {
        tracing::error!(error = %e, "ライブラリ保存に失敗");
        e.to_string()
    })
}

// 新規追加分を登録し、CBZ/PDFのページ数を並列に数える
fn import_paths(app: &AppHandle, paths: Vec<PathBuf>, folder_id: Option<String>) -> Result<Vec<ComicBook>, String> {
    let state = app.state::<AppState>();
    let added = lock(&state.library)?.add_books(paths.as_slice(), folder_id.as_deref());
    if added.is_empty() {
        return Ok(added);
    }

    let counts: Vec<(String, u32)> = added
        .par_iter()
        .map(|comic| (comic.id.clone(), library::page_count(Path::new(&comic.file_path), comic.format)))
        .collect();

    let mut library = lock(&state.library)?;
    for (id, total) in &counts {
        // 数えている間に削除された作品は無視
        let _ = library.set_total_pages(id, *total);
    }
    save_library(&state, &library)?;
    let added: Vec<ComicBook> = added
        .iter()
        .filter_map(|c| library.comic(&c.id).ok().cloned())
        .collect();
    drop(library);

    let mut queue = lock(&state.cover_queue)?;
    for comic in &added {
        queue.enqueue(comic.id.clone());
    }
    tracing::info!(count = added.len(), "作品を追加");
    Ok(added)
}

// フォルダ配下の対応ファイル（自然順）
fn scan_comic_folder(folder: &Path) -> Result<Vec<PathBuf>, String> {
    if !folder.is_dir() {
        return Err("無効なフォルダパス".to_string());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::warn!(error = %e, "ディレクトリエントリ読み込みエラー");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| COMIC_EXTENSIONS.contains(&extension_of(p).as_str()))
        .collect();
    files.sort_by(|a, b| natord::compare(&a.to_string_lossy(), &b.to_string_lossy()));
    Ok(files)
}

/// 表紙キューを1件ずつ処理する。処理中があれば何もしない。
pub fn pump_covers(app: &AppHandle) {
    let state = app.state::<AppState>();
    let next = match lock(&state.cover_queue) {
        Ok(mut queue) => queue.start_next(),
        Err(e) => {
            tracing::error!(error = %e, "表紙キューの取得に失敗");
            return;
        }
    };
    let Some(comic_id) = next else {
        return;
    };

    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        let handle = app.clone();
        let id = comic_id.clone();
        let result = tokio::task::spawn_blocking(move || generate_cover_for(&handle, &id)).await;
        let succeeded = match result {
            Ok(Ok(cover_path)) => {
                let payload = CoverReady { comic_id: comic_id.clone(), cover_path };
                if let Err(e) = app.emit("cover-ready", payload) {
                    tracing::warn!(error = %e, "cover-ready イベント送信に失敗");
                }
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(comic = %comic_id, error = %e, "表紙生成に失敗");
                false
            }
            Err(e) => {
                tracing::error!(comic = %comic_id, error = %e, "表紙生成タスクが異常終了");
                false
            }
        };

        let state = app.state::<AppState>();
        if let Ok(mut queue) = lock(&state.cover_queue) {
            if succeeded {
                queue.finish(&comic_id);
            } else {
                queue.fail(&comic_id);
            }
        }
        pump_covers(&app);
    });
}

fn generate_cover_for(app: &AppHandle, comic_id: &str) -> Result<String, String> {
    let state = app.state::<AppState>();
    let (file_path, format) = {
        let library = lock(&state.library)?;
        let comic = library.comic(comic_id).map_err(|e| e.to_string())?;
        (PathBuf::from(&comic.file_path), comic.format)
    };

    let cache = app.state::<CoverCache>();
    let cover = extract_cover(&file_path, format, &cache)?;

    let mut library = lock(&state.library)?;
    library
        .set_cover(comic_id, cover.cache_path.clone())
        .map_err(|e| e.to_string())?;
    save_library(&state, &library)?;
    Ok(cover.cache_path)
}

// 削除された作品の表紙とリーダーを片付ける
fn forget_removed(state: &AppState, removed: &[ComicBook]) -> Result<(), String> {
    if reader::close_if_removed(&mut *lock(&state.reader)?, removed) {
        tracing::info!("開いていた作品が削除されたためリーダーを閉じる");
    }
    let mut queue = lock(&state.cover_queue)?;
    let mut memory = lock(&state.memory_cache)?;
    for comic in removed {
        queue.remove(&comic.id);
        memory.remove(&comic.id);
        if let Some(path) = &comic.cover_path {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::debug!(path = %path, error = %e, "表紙キャッシュ削除をスキップ");
            }
        }
    }
    Ok(())
}

#[tauri::command]
pub fn get_library(state: State<'_, AppState>) -> Result<LibraryData, String> {
    Ok(lock(&state.library)?.data().clone())
}

#[tauri::command]
pub async fn import_comics(
    paths: Vec<String>,
    folder_id: Option<String>,
    app: AppHandle,
) -> Result<Vec<ComicBook>, String> {
    let handle = app.clone();
    let paths: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();
    let added = tokio::task::spawn_blocking(move || import_paths(&handle, paths, folder_id))
        .await
        .map_err(|e| e.to_string())??;
    pump_covers(&app);
    Ok(added)
}

#[tauri::command]
pub async fn import_comic_folder(
    folder_path: String,
    folder_id: Option<String>,
    app: AppHandle,
) -> Result<Vec<ComicBook>, String> {
    let handle = app.clone();
    let added = tokio::task::spawn_blocking(move || {
        let paths = scan_comic_folder(Path::new(&folder_path))?;
        import_paths(&handle, paths, folder_id)
    })
    .await
    .map_err(|e| e.to_string())??;
    pump_covers(&app);
    Ok(added)
}

#[tauri::command]
pub fn delete_comics(
    comic_ids: Vec<String>,
    confirmed: bool,
    state: State<'_, AppState>,
) -> Result<usize, String> {
    let mut library = lock(&state.library)?;
    let removed = library
        .delete_books(&comic_ids, confirmed)
        .map_err(|e| e.to_string())?;
    save_library(&state, &library)?;
    drop(library);
    forget_removed(&state, &removed)?;
    Ok(removed.len())
}

#[tauri::command]
pub fn move_comic_to_folder(
    comic_id: String,
    folder_id: Option<String>,
    state: State<'_, AppState>,
) -> Result<(), String> {
    let mut library = lock(&state.library)?;
    library
        .move_to_folder(&comic_id, folder_id.as_deref())
        .map_err(|e| e.to_string())?;
    save_library(&state, &library)
}

#[tauri::command]
pub fn create_folder(
    name: String,
    parent_id: Option<String>,
    state: State<'_, AppState>,
) -> Result<Folder, String> {
    let mut library = lock(&state.library)?;
    let folder = library
        .create_folder(&name, parent_id.as_deref())
        .map_err(|e| e.to_string())?;
    save_library(&state, &library)?;
    Ok(folder)
}

#[tauri::command]
pub fn rename_folder(folder_id: String, name: String, state: State<'_, AppState>) -> Result<(), String> {
    let mut library = lock(&state.library)?;
    library.rename_folder(&folder_id, &name).map_err(|e| e.to_string())?;
    save_library(&state, &library)
}

#[tauri::command]
pub fn delete_folder(
    folder_id: String,
    confirmed: bool,
    state: State<'_, AppState>,
) -> Result<usize, String> {
    let mut library = lock(&state.library)?;
    let removed = library
        .delete_folder(&folder_id, confirmed)
        .map_err(|e| e.to_string())?;
    save_library(&state, &library)?;
    drop(library);
    forget_removed(&state, &removed)?;
    Ok(removed.len())
}

#[tauri::command]
pub fn group_folders(
    name: String,
    folder_ids: Vec<String>,
    state: State<'_, AppState>,
) -> Result<Folder, String> {
    let mut library = lock(&state.library)?;
    let group = library
        .group_folders(&name, &folder_ids)
        .map_err(|e| e.to_string())?;
    save_library(&state, &library)?;
    Ok(group)
}

#[tauri::command]
pub fn auto_organize(state: State<'_, AppState>) -> Result<Vec<Folder>, String> {
    let mut library = lock(&state.library)?;
    let folders = library.auto_organize().map_err(|e| e.to_string())?;
    if !folders.is_empty() {
        save_library(&state, &library)?;
    }
    Ok(folders)
}

#[tauri::command]
pub fn search_comics(query: String, state: State<'_, AppState>) -> Result<Vec<ComicBook>, String> {
    Ok(lock(&state.library)?.search(&query))
}

#[tauri::command]
pub fn get_folder_contents(
    folder_id: Option<String>,
    state: State<'_, AppState>,
) -> Result<FolderContents, String> {
    lock(&state.library)?
        .folder_contents(folder_id.as_deref())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn validate_library_files(state: State<'_, AppState>) -> Result<Vec<FileValidationResult>, String> {
    let mut library = lock(&state.library)?;
    let results = library.validate_files();
    save_library(&state, &library)?;
    drop(library);
    // 戻ってきたファイルの表紙を再試行できるようにする
    lock(&state.cover_queue)?.clear_failures();
    Ok(results)
}

/// ライブラリ・エディタ・表紙キャッシュをすべて初期化
#[tauri::command]
pub fn factory_reset(
    confirmed: bool,
    state: State<'_, AppState>,
    cache: State<'_, CoverCache>,
) -> Result<(), String> {
    let mut library = lock(&state.library)?;
    library.factory_reset(confirmed).map_err(|e| e.to_string())?;
    save_library(&state, &library)?;
    drop(library);

    state.kv_store.remove(EDITOR_STORE_KEY)?;
    lock(&state.editor)?.replace(Default::default());
    *lock(&state.reader)? = None;
    lock(&state.cover_queue)?.clear();
    lock(&state.memory_cache)?.clear();
    let removed = cache.clear()?;
    tracing::info!(covers = removed, "初期化しました");
    Ok(())
}

/// 表紙のdata URL。未生成ならキューに積んで None（プレースホルダ表示）。
#[tauri::command]
pub fn get_cover(comic_id: String, app: AppHandle, state: State<'_, AppState>) -> Result<Option<String>, String> {
    if let Some(url) = lock(&state.memory_cache)?.get(&comic_id) {
        return Ok(Some(url));
    }

    let (cover_path, missing) = {
        let library = lock(&state.library)?;
        let comic = library.comic(&comic_id).map_err(|e| e.to_string())?;
        (comic.cover_path.clone(), comic.missing)
    };
    // ファイルが無い作品はプレースホルダのまま
    if missing {
        return Ok(None);
    }
    if let Some(path) = cover_path {
        if let Ok(bytes) = std::fs::read(&path) {
            let url = to_data_url("image/jpeg", &bytes);
            lock(&state.memory_cache)?.insert(comic_id, url.clone());
            return Ok(Some(url));
        }
    }

    lock(&state.cover_queue)?.enqueue(comic_id);
    pump_covers(&app);
    Ok(None)
}
