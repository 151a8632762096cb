use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComicFormat {
    Cbz,
    Pdf,
}

impl ComicFormat {
    /// 拡張子から形式を判定（大文字小文字は無視）
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "cbz" => Some(ComicFormat::Cbz),
            "pdf" => Some(ComicFormat::Pdf),
            _ => None,
        }
    }
}

// ライブラリに登録された1冊
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicBook {
    pub id: String,
    pub title: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_path: Option<String>,
    pub format: ComicFormat,
    pub total_pages: u32,
    pub last_read_page: u32,
    pub date_added: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    // ファイル参照切れ（起動時の検証で更新）
    #[serde(default)]
    pub missing: bool,
}

// フォルダ（parent_id で木構造）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

// 永続化テーブル（comics + folders）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryData {
    #[serde(default)]
    pub comics: Vec<ComicBook>,
    #[serde(default)]
    pub folders: Vec<Folder>,
}

// フォルダ表示用の中身
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderContents {
    pub folder_id: Option<String>,
    pub breadcrumbs: Vec<Folder>,
    pub folders: Vec<Folder>,
    pub comics: Vec<ComicBook>,
}

// ファイル検証結果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileValidationResult {
    pub comic_id: String,
    pub status: String,  // "found", "missing"
    pub file_path: String,
}
