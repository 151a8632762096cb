mod image;

pub use self::image::generate_cover_from_bytes;

use std::fs;
use std::path::Path;
use serde::Serialize;
use crate::cache::CoverCache;
use crate::library;
use crate::types::ComicFormat;

/// 表紙生成結果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverResult {
    /// キャッシュキー（MD5ハッシュ）
    pub cache_key: String,
    /// キャッシュファイルの絶対パス（asset プロトコル用）
    pub cache_path: String,
    /// ステータス: "cached" | "generated"
    pub status: String,
}

/// 作品の1ページ目から表紙を作りディスクキャッシュに保存
pub fn extract_cover(file_path: &Path, format: ComicFormat, cache: &CoverCache) -> Result<CoverResult, String> {
    if !file_path.exists() {
        return Err("ファイルが存在しません".to_string());
    }

    let cache_key = CoverCache::cache_key(file_path)?;
    let cached_path = cache.path_for(&cache_key);
    let cache_path = cached_path.to_string_lossy().to_string();

    // ディスクキャッシュチェック
    if cached_path.exists() {
        return Ok(CoverResult {
            cache_key,
            cache_path,
            status: "cached".to_string(),
        });
    }

    let (bytes, _) = library::read_page(file_path, format, 1)
        .map_err(|e| format!("表紙ページ読み込みエラー: {:#}", e))?;
    let cover = generate_cover_from_bytes(&bytes)?;

    // ディスクキャッシュに保存
    fs::write(&cached_path, &cover).map_err(|e| e.to_string())?;

    Ok(CoverResult {
        cache_key,
        cache_path,
        status: "generated".to_string(),
    })
}
