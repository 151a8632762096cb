mod constants;
mod types;
mod error;
mod logging;
mod cache;
mod state;
mod image_utils;
mod thumbnail;
mod editor;
mod render;
mod library;
mod reader;
mod commands;

use std::sync::Mutex;
use cache::{CoverCache, CoverMemoryCache};
use constants::MEMORY_CACHE_MAX_SIZE;
use library::store::{config_dir, KeyValueStore, LibraryStore};
use library::{CoverQueue, Library};
use state::AppState;

// Tauri コマンドを再エクスポート
use commands::editor::{
    add_page_files, dispatch_editor_action, handle_shortcut, load_editor_state, load_saved_editor,
    parse_script, redo, undo,
};
use commands::export::{export_page, export_pages_zip};
use commands::library::{
    auto_organize, create_folder, delete_comics, delete_folder, factory_reset, get_cover,
    get_folder_contents, get_library, group_folders, import_comic_folder, import_comics,
    move_comic_to_folder, rename_folder, search_comics, validate_library_files,
};
use commands::reader::{
    open_comic, read_page, reader_jump, reader_next, reader_prev, reader_report_visibility,
    reader_set_mode, reader_set_zoom,
};

fn initial_state() -> AppState {
    let dir = config_dir();
    let library_store = LibraryStore::new(&dir);
    let kv_store = KeyValueStore::new(&dir);

    let mut library = Library::new(library_store.load());
    // 前回終了後に消えたファイルを検出
    let missing = library
        .validate_files()
        .iter()
        .filter(|r| r.status == "missing")
        .count();
    tracing::info!(
        comics = library.data().comics.len(),
        missing,
        dir = %dir.display(),
        "ライブラリを読み込み"
    );

    AppState {
        editor: Mutex::new(load_saved_editor(&kv_store)),
        library: Mutex::new(library),
        reader: Mutex::new(None),
        cover_queue: Mutex::new(CoverQueue::new()),
        memory_cache: Mutex::new(CoverMemoryCache::new(MEMORY_CACHE_MAX_SIZE)),
        library_store,
        kv_store,
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    logging::init();

    if let Err(e) = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .manage(CoverCache::new())
        .manage(initial_state())
        .invoke_handler(tauri::generate_handler![
            load_editor_state,
            dispatch_editor_action,
            undo,
            redo,
            handle_shortcut,
            parse_script,
            add_page_files,
            export_page,
            export_pages_zip,
            get_library,
            import_comics,
            import_comic_folder,
            delete_comics,
            move_comic_to_folder,
            create_folder,
            rename_folder,
            delete_folder,
            group_folders,
            auto_organize,
            search_comics,
            get_folder_contents,
            validate_library_files,
            factory_reset,
            get_cover,
            open_comic,
            read_page,
            reader_next,
            reader_prev,
            reader_jump,
            reader_set_mode,
            reader_set_zoom,
            reader_report_visibility,
        ])
        .run(tauri::generate_context!())
    {
        tracing::error!(error = %e, "Tauriアプリケーション起動エラー");
        std::process::exit(1);
    }
}
