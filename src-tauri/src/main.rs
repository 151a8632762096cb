// リリースビルドでWindowsの追加コンソールウィンドウを抑止
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    comic_studio_tauri_lib::run()
}
