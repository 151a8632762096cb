// 表紙サムネイル設定
pub const COVER_WIDTH: u32 = 300;
pub const COVER_JPEG_QUALITY: u8 = 80;

// 画像サイズ制限（DoS防止）
pub const MAX_IMAGE_DIMENSION: u32 = 65535;      // 最大辺長
pub const MAX_PIXEL_COUNT: u64 = 100_000_000;    // 最大ピクセル数（100メガピクセル）

// サポートする拡張子
pub const COMIC_EXTENSIONS: &[&str] = &["cbz", "pdf"];
pub const PAGE_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

// メモリキャッシュサイズ
pub const MEMORY_CACHE_MAX_SIZE: usize = 20;  // 表紙data URLを最大20件保持

// 書き出し（0.85相当）
pub const EXPORT_JPEG_QUALITY: u8 = 85;

// レイアウト（プレビュー基準のpx）
pub const LAYOUT_GAP: f64 = 10.0;
pub const LINE_HEIGHT_RATIO: f64 = 1.16;
pub const DEFAULT_PREVIEW_WIDTH: f64 = 800.0;
pub const DEFAULT_BOX_WIDTH_RATIO: f64 = 0.4;

// 履歴
pub const MAX_HISTORY: usize = 100;

// リーダー
pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 5.0;

// PDFラスタライズ解像度（モバイルはメモリ節約のため低め）
pub const PDF_DPI_DESKTOP: u32 = 150;
pub const PDF_DPI_MOBILE: u32 = 96;

// 永続化
pub const APP_DIR_NAME: &str = "comic-studio";
pub const EDITOR_STORE_KEY: &str = "comic-studio-editor";
pub const LIBRARY_FILE_NAME: &str = "library.json";
