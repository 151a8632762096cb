use std::sync::{Mutex, MutexGuard};
use crate::cache::CoverMemoryCache;
use crate::editor::EditorStore;
use crate::library::store::{KeyValueStore, LibraryStore};
use crate::library::{CoverQueue, Library};
use crate::reader::ReaderSession;

// アプリケーション状態（各状態はMutexで1箇所が所有）
pub struct AppState {
    pub editor: Mutex<EditorStore>,
    pub library: Mutex<Library>,
    pub reader: Mutex<Option<ReaderSession>>,
    pub cover_queue: Mutex<CoverQueue>,
    pub memory_cache: Mutex<CoverMemoryCache>,
    pub library_store: LibraryStore,
    pub kv_store: KeyValueStore,
}

// ロック取得（poisonはエラー文字列に変換）
pub fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, String> {
    mutex.lock().map_err(|e| format!("状態のロックに失敗: {}", e))
}
