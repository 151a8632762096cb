use std::path::PathBuf;
use tauri::State;

use crate::editor::layout::EstimatedMetrics;
use crate::render::export::{export_single, export_zip};
use crate::state::{lock, AppState};
use crate::types::ExportSummary;

// 親ディレクトリが存在することを確認
fn prepare_output(output_path: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(output_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| format!("ディレクトリ作成エラー: {}", e))?;
    }
    Ok(path)
}

/// 1ページを元画像解像度でJPEG書き出し
#[tauri::command]
pub async fn export_page(
    page_id: String,
    output_path: String,
    state: State<'_, AppState>,
) -> Result<ExportSummary, String> {
    let snapshot = lock(&state.editor)?.state().clone();
    let page = snapshot
        .page(&page_id)
        .cloned()
        .ok_or_else(|| format!("ページが見つかりません: {}", page_id))?;
    let output = prepare_output(&output_path)?;

    tokio::task::spawn_blocking(move || {
        export_single(&page, &snapshot, &EstimatedMetrics, &output).map_err(|e| {
            tracing::error!(error = ?e, "ページ書き出しに失敗");
            e.to_string()
        })
    })
    .await
    .map_err(|e| e.to_string())?
}

/// 全ページをZIPにまとめて書き出し（ページは順番に描画）
#[tauri::command]
pub async fn export_pages_zip(
    output_path: String,
    state: State<'_, AppState>,
) -> Result<ExportSummary, String> {
    let snapshot = lock(&state.editor)?.state().clone();
    if snapshot.pages.is_empty() {
        return Err("書き出すページがありません".to_string());
    }
    let output = prepare_output(&output_path)?;

    tokio::task::spawn_blocking(move || {
        export_zip(&snapshot, &EstimatedMetrics, &output).map_err(|e| {
            tracing::error!(error = ?e, "ZIP書き出しに失敗");
            e.to_string()
        })
    })
    .await
    .map_err(|e| e.to_string())?
}
