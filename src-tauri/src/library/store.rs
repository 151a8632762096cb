use std::fs;
use std::path::{Path, PathBuf};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::{APP_DIR_NAME, LIBRARY_FILE_NAME};
use crate::error::LibraryError;
use crate::types::LibraryData;

/// アプリ設定ディレクトリ
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

// JSONとして書き込み（親ディレクトリは作成する）
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("ディレクトリ作成エラー: {}", e))?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("JSONシリアライズエラー: {}", e))?;
    fs::write(path, json).map_err(|e| format!("ファイル書き込みエラー: {}", e))
}

// 読み込みに失敗したらデフォルト値（警告ログのみ）
fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
    match parsed {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "保存データの読み込みに失敗したため初期状態を使用");
            T::default()
        }
    }
}

/// ライブラリ（comics / folders）の保存先
pub struct LibraryStore {
    path: PathBuf,
}

impl LibraryStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(LIBRARY_FILE_NAME),
        }
    }

    pub fn load(&self) -> LibraryData {
        read_json_or_default(&self.path)
    }

    pub fn save(&self, data: &LibraryData) -> Result<(), LibraryError> {
        write_json(&self.path, data).map_err(LibraryError::Store)
    }
}

/// キーごとに1ファイルのJSONキーバリューストア
pub struct KeyValueStore {
    dir: PathBuf,
}

impl KeyValueStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.join("store"),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }

    pub fn get<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        read_json_or_default(&self.path_for(key))
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), String> {
        write_json(&self.path_for(key), value)
    }

    pub fn remove(&self, key: &str) -> Result<(), String> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| format!("ファイル削除エラー: {}", e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EDITOR_STORE_KEY;
    use crate::types::{ComicBook, ComicFormat, EditorState};

    #[test]
    fn library_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LibraryStore::new(dir.path());
        assert_eq!(store.load(), LibraryData::default());

        let data = LibraryData {
            comics: vec![ComicBook {
                id: "c1".into(),
                title: "Vol 1".into(),
                file_path: "/books/Vol 1.cbz".into(),
                cover_path: None,
                format: ComicFormat::Cbz,
                total_pages: 12,
                last_read_page: 3,
                date_added: "2024-01-01T00:00:00Z".into(),
                folder_id: None,
                missing: false,
            }],
            folders: Vec::new(),
        };
        store.save(&data).expect("save");
        assert_eq!(store.load(), data);

        let raw = fs::read_to_string(dir.path().join(LIBRARY_FILE_NAME)).expect("read");
        assert!(raw.contains("\"lastReadPage\": 3"));
    }

    #[test]
    fn save_failure_is_a_store_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").expect("write");
        let store = LibraryStore::new(&blocker);
        assert!(matches!(store.save(&LibraryData::default()), Err(LibraryError::Store(_))));
    }

    #[test]
    fn corrupt_data_falls_back_to_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(LIBRARY_FILE_NAME), "{ not json").expect("write");
        assert_eq!(LibraryStore::new(dir.path()).load(), LibraryData::default());

        let kv = KeyValueStore::new(dir.path());
        let state: EditorState = kv.get(EDITOR_STORE_KEY);
        assert!(state.pages.is_empty());
    }

    #[test]
    fn key_value_store_sets_and_removes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let kv = KeyValueStore::new(dir.path());
        kv.set("a/b", &vec![1, 2, 3]).expect("set");
        assert_eq!(kv.get::<Vec<i32>>("a/b"), vec![1, 2, 3]);
        kv.remove("a/b").expect("remove");
        assert!(kv.get::<Vec<i32>>("a/b").is_empty());
    }
}
