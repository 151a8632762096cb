//! ページ単体 / ZIP一括の書き出し

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use anyhow::{Context, Result};
use zip::write::FileOptions;
use zip::ZipWriter;

use super::plan_page;
use super::svg::{build_page_svg, rasterize};
use crate::constants::EXPORT_JPEG_QUALITY;
use crate::editor::layout::TextMeasure;
use crate::error::ExportError;
use crate::image_utils::{encode_jpeg, mime_for_path, to_data_url, validate_dimensions};
use crate::types::{EditorState, ExportSummary, Page};

/// ページを元画像解像度で描画しJPEGにする
pub fn render_page_jpeg(page: &Page, state: &EditorState, measure: &dyn TextMeasure) -> Result<Vec<u8>> {
    let image_path = Path::new(&page.image_path);
    let bytes = fs::read(image_path)
        .with_context(|| format!("failed to read page image {}", image_path.display()))?;

    // 記録済みの寸法が無い場合は画像から取る
    let mut page = page.clone();
    if page.image_width == 0 || page.image_height == 0 {
        let (w, h) = image::load_from_memory(&bytes)
            .with_context(|| format!("failed to decode {}", image_path.display()))?
            .into_rgb8()
            .dimensions();
        page.image_width = w;
        page.image_height = h;
    }
    validate_dimensions(page.image_width, page.image_height).map_err(anyhow::Error::msg)?;

    let plan = plan_page(&page, &state.global_style, state.hide_labels, state.preview_width, measure);
    let background = to_data_url(mime_for_path(image_path), &bytes);
    let svg = build_page_svg(&plan, &background);
    let rendered = rasterize(&svg)?;
    encode_jpeg(&rendered, EXPORT_JPEG_QUALITY).map_err(anyhow::Error::msg)
}

/// ZIP内のエントリ名（1始まりの3桁連番 + 元ファイル名の拡張子なし部分）
pub fn zip_entry_name(index: usize, file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("page");
    format!("{:03}_{}.jpg", index + 1, stem)
}

pub fn export_single(
    page: &Page,
    state: &EditorState,
    measure: &dyn TextMeasure,
    output_path: &Path,
) -> Result<ExportSummary, ExportError> {
    let jpeg = render_page_jpeg(page, state, measure).map_err(ExportError::Page)?;
    fs::write(output_path, jpeg)
        .with_context(|| format!("failed to write {}", output_path.display()))
        .map_err(ExportError::Page)?;
    tracing::info!(page = %page.id, path = %output_path.display(), "page exported");
    Ok(ExportSummary {
        output_path: output_path.to_string_lossy().to_string(),
        page_count: 1,
    })
}

/// 全ページを順に描画しZIPにまとめる。途中で失敗したらファイルは作らない。
pub fn export_zip(
    state: &EditorState,
    measure: &dyn TextMeasure,
    output_path: &Path,
) -> Result<ExportSummary, ExportError> {
    let archive = build_zip(state, measure).map_err(ExportError::Zip)?;
    fs::write(output_path, archive)
        .with_context(|| format!("failed to write {}", output_path.display()))
        .map_err(ExportError::Zip)?;
    tracing::info!(pages = state.pages.len(), path = %output_path.display(), "zip exported");
    Ok(ExportSummary {
        output_path: output_path.to_string_lossy().to_string(),
        page_count: state.pages.len(),
    })
}

fn build_zip(state: &EditorState, measure: &dyn TextMeasure) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    for (index, page) in state.pages.iter().enumerate() {
        let jpeg = render_page_jpeg(page, state, measure)
            .with_context(|| format!("page {} ({})", index + 1, page.file_name))?;
        writer.start_file(zip_entry_name(index, &page.file_name), options)?;
        writer.write_all(&jpeg)?;
    }

    Ok(writer.finish()?.into_inner())
}
