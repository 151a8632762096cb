pub mod catalog;
pub mod cbz;
pub mod cover_queue;
pub mod pdf;
pub mod store;

pub use catalog::Library;
pub use cover_queue::CoverQueue;

use std::path::Path;
use anyhow::Result;
use crate::types::ComicFormat;

/// ページ数（読めない場合はログを出して0）
pub fn page_count(path: &Path, format: ComicFormat) -> u32 {
    let result = match format {
        ComicFormat::Cbz => cbz::list_pages(path).map(|pages| pages.len() as u32),
        ComicFormat::Pdf => pdf::page_count(path),
    };
    result.unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "ページ数の取得に失敗");
        0
    })
}

/// ページ画像（1始まり）の生バイトとMIMEタイプ
pub fn read_page(path: &Path, format: ComicFormat, page: u32) -> Result<(Vec<u8>, &'static str)> {
    match format {
        ComicFormat::Cbz => cbz::read_page(path, page),
        ComicFormat::Pdf => Ok((pdf::render_page(path, page, pdf::render_dpi())?, "image/png")),
    }
}
