use std::path::PathBuf;
use tauri::{AppHandle, Manager, State};

use crate::commands::library::save_library;
use crate::error::ReaderError;
use crate::image_utils::to_data_url;
use crate::library;
use crate::reader::{self, ReaderSession};
use crate::state::{lock, AppState};
use crate::types::{ChapterStart, NavOutcome, PageImage, PageVisibility, ReaderStep, ReaderView, ViewMode};

// 現在ページを lastReadPage として書き戻す
fn checkpoint(state: &AppState, session: &ReaderSession) -> Result<(), String> {
    let mut library = lock(&state.library)?;
    library
        .set_last_read(session.book_id(), session.current_page())
        .map_err(|e| e.to_string())?;
    save_library(state, &library)
}

// セッションに操作を適用し、ページが変わったら保存
fn with_session<T>(
    state: &AppState,
    apply: impl FnOnce(&mut ReaderSession) -> Result<T, ReaderError>,
) -> Result<(T, ReaderView), String> {
    let mut guard = lock(&state.reader)?;
    let session = guard.as_mut().ok_or_else(|| ReaderError::NoSession.to_string())?;
    let mut library = lock(&state.library)?;
    let (value, moved) = reader::apply_step(session, &mut library, apply).map_err(|e| e.to_string())?;
    if moved {
        save_library(state, &library)?;
    }
    Ok((value, session.view()))
}

/// 作品を開く（総ページ数が未取得ならここで数える）
#[tauri::command]
pub async fn open_comic(
    comic_id: String,
    queue: Vec<String>,
    mode: Option<ViewMode>,
    start: Option<ChapterStart>,
    app: AppHandle,
) -> Result<ReaderView, String> {
    let handle = app.clone();
    tokio::task::spawn_blocking(move || {
        let state = handle.state::<AppState>();
        let (mut comic, path) = {
            let library = lock(&state.library)?;
            let comic = library.ensure_openable(&comic_id).map_err(|e| e.to_string())?.clone();
            let path = PathBuf::from(&comic.file_path);
            (comic, path)
        };
        if comic.total_pages == 0 {
            comic.total_pages = library::page_count(&path, comic.format);
            lock(&state.library)?
                .set_total_pages(&comic.id, comic.total_pages)
                .map_err(|e| e.to_string())?;
        }
        if comic.total_pages == 0 {
            return Err(format!("ページを読み込めません: {}", comic.title));
        }

        let mut reader = lock(&state.reader)?;
        let mode = mode
            .or_else(|| reader.as_ref().map(|s| s.mode()))
            .unwrap_or(ViewMode::Single);
        let session = ReaderSession::open(&comic, comic.total_pages, queue, mode, start);
        checkpoint(&state, &session)?;
        let view = session.view();
        *reader = Some(session);
        tracing::info!(comic = %comic.id, page = view.current_page, "作品を開く");
        Ok(view)
    })
    .await
    .map_err(|e| e.to_string())?
}

/// ページ画像（1始まり）を data URL で返す
#[tauri::command]
pub async fn read_page(page: u32, app: AppHandle) -> Result<PageImage, String> {
    let handle = app.clone();
    tokio::task::spawn_blocking(move || {
        let state = handle.state::<AppState>();
        let book_id = lock(&state.reader)?
            .as_ref()
            .map(|s| s.book_id().to_string())
            .ok_or_else(|| ReaderError::NoSession.to_string())?;
        let (path, format) = {
            let library = lock(&state.library)?;
            let comic = library.ensure_openable(&book_id).map_err(|e| e.to_string())?;
            (PathBuf::from(&comic.file_path), comic.format)
        };
        let (bytes, mime) = library::read_page(&path, format, page).map_err(|e| {
            tracing::warn!(comic = %book_id, page, error = %e, "ページ読み込みに失敗");
            format!("ページ読み込みエラー: {}", e)
        })?;
        Ok(PageImage {
            page,
            data_url: to_data_url(mime, &bytes),
        })
    })
    .await
    .map_err(|e| e.to_string())?
}

#[tauri::command]
pub fn reader_next(state: State<'_, AppState>) -> Result<ReaderStep, String> {
    let (outcome, view) = with_session(&state, |s| Ok(s.next()))?;
    Ok(ReaderStep { outcome, view })
}

#[tauri::command]
pub fn reader_prev(state: State<'_, AppState>) -> Result<ReaderStep, String> {
    let (outcome, view) = with_session(&state, |s| Ok(s.prev()))?;
    Ok(ReaderStep { outcome, view })
}

#[tauri::command]
pub fn reader_jump(page: u32, state: State<'_, AppState>) -> Result<ReaderStep, String> {
    let (outcome, view) = with_session(&state, |s| s.jump(page))?;
    Ok(ReaderStep { outcome, view })
}

#[tauri::command]
pub fn reader_set_mode(mode: ViewMode, state: State<'_, AppState>) -> Result<ReaderView, String> {
    let (_, view) = with_session(&state, |s| {
        s.set_mode(mode);
        Ok(())
    })?;
    Ok(view)
}

#[tauri::command]
pub fn reader_set_zoom(zoom: f64, state: State<'_, AppState>) -> Result<ReaderView, String> {
    let (_, view) = with_session(&state, |s| Ok(s.set_zoom(zoom)))?;
    Ok(view)
}

#[tauri::command]
pub fn reader_report_visibility(
    pages: Vec<PageVisibility>,
    state: State<'_, AppState>,
) -> Result<ReaderStep, String> {
    let ratios: Vec<(u32, f64)> = pages.iter().map(|p| (p.page, p.ratio)).collect();
    let (changed, view) = with_session(&state, |s| Ok(s.report_visibility(&ratios)))?;
    let outcome = match changed {
        Some(page) => NavOutcome::Page { page },
        None => NavOutcome::None,
    };
    Ok(ReaderStep { outcome, view })
}
