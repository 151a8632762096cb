use crate::image_utils::create_cover;

// 先頭ページの画像データから表紙を生成
pub fn generate_cover_from_bytes(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| format!("画像読み込みエラー: {}", e))?;

    create_cover(img)
}
