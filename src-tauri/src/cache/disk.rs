use std::fs;
use std::path::{Path, PathBuf};
use crate::constants::{APP_DIR_NAME, COVER_WIDTH};

// 表紙キャッシュディレクトリ
pub struct CoverCache {
    pub cache_dir: PathBuf,
}

impl CoverCache {
    pub fn new() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join("covers");
        Self::at(cache_dir)
    }

    pub fn at(cache_dir: PathBuf) -> Self {
        // キャッシュディレクトリ作成（エラー時はログ出力）
        if let Err(e) = fs::create_dir_all(&cache_dir) {
            tracing::error!(dir = %cache_dir.display(), error = %e, "キャッシュディレクトリ作成失敗");
        }
        Self { cache_dir }
    }

    /// (パス, 更新時刻, サイズ) から作るキャッシュキー
    pub fn cache_key(file_path: &Path) -> Result<String, String> {
        let metadata = fs::metadata(file_path).map_err(|e| format!("ファイル情報取得エラー: {}", e))?;
        let modified = metadata
            .modified()
            .map(|t| t.duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis() as u64)
            .unwrap_or(0);
        let input = format!("{}:{}:{}:{}", file_path.display(), modified, metadata.len(), COVER_WIDTH);
        Ok(format!("{:x}", md5::compute(&input)))
    }

    pub fn path_for(&self, cache_key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.jpg", cache_key))
    }

    /// キャッシュ済みの表紙をすべて削除
    pub fn clear(&self) -> Result<usize, String> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(0),
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| format!("キャッシュ削除エラー: {}", e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_changes_with_file_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("a.cbz");
        fs::write(&file, b"one").expect("write");
        let first = CoverCache::cache_key(&file).expect("key");
        assert_eq!(first, CoverCache::cache_key(&file).expect("key"));
        fs::write(&file, b"longer contents").expect("write");
        assert_ne!(first, CoverCache::cache_key(&file).expect("key"));
        assert!(CoverCache::cache_key(&dir.path().join("none")).is_err());
    }

    #[test]
    fn clear_removes_cached_covers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = CoverCache::at(dir.path().join("covers"));
        fs::write(cache.path_for("k1"), b"x").expect("write");
        fs::write(cache.path_for("k2"), b"x").expect("write");
        assert_eq!(cache.clear().expect("clear"), 2);
        assert!(!cache.path_for("k1").exists());
    }
}
