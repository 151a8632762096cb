use std::io::Cursor;
use std::path::Path;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use crate::constants::{COVER_JPEG_QUALITY, COVER_WIDTH, MAX_IMAGE_DIMENSION, MAX_PIXEL_COUNT};

// 画像サイズ検証（DoS防止）
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), String> {
    if width == 0 || height == 0 {
        return Err("無効な画像サイズ: 幅または高さが0".to_string());
    }
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(format!(
            "画像サイズが大きすぎます: {}x{} (最大: {})",
            width, height, MAX_IMAGE_DIMENSION
        ));
    }
    let pixel_count = (width as u64) * (height as u64);
    if pixel_count > MAX_PIXEL_COUNT {
        return Err(format!(
            "ピクセル数が多すぎます: {} (最大: {})",
            pixel_count, MAX_PIXEL_COUNT
        ));
    }
    Ok(())
}

// 拡張子からMIMEタイプを取得
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

pub fn mime_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(mime_for_extension)
        .unwrap_or("application/octet-stream")
}

// 小文字の拡張子
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// base64 data URL
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

// JPEGにエンコード（アルファは捨てる）
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| format!("JPEG書き出しエラー: {}", e))?;
    Ok(buffer.into_inner())
}

// 画像を表紙サムネイルに変換
pub fn create_cover(img: DynamicImage) -> Result<Vec<u8>, String> {
    use image::imageops::FilterType;

    validate_dimensions(img.width(), img.height())?;

    // Triangle: 高速なリサンプリングフィルタ（サムネイル用途では十分な品質）
    let cover = img.resize(COVER_WIDTH, COVER_WIDTH * 16 / 10, FilterType::Triangle);
    encode_jpeg(&cover, COVER_JPEG_QUALITY)
}
