use serde::{Deserialize, Serialize};
use super::style::{SavedStyle, TextStyle};
use crate::constants::DEFAULT_PREVIEW_WIDTH;

fn default_true() -> bool {
    true
}

/// セリフ・キャプションのテキストボックス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextObject {
    pub id: String,
    pub original_text: String,
    /// ボックス左上（ページ幅・高さに対する%）
    pub x: f64,
    pub y: f64,
    /// テキスト領域の幅 (px, プレビュー基準)
    pub width: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(flatten)]
    pub style: TextStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskKind {
    Rect,
    /// バケツ塗りなどで生成されたマスク（fill に data URL）
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskShape {
    Rect,
    Ellipse,
}

/// 写植前の元セリフを隠す塗りつぶし
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskObject {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    #[serde(rename = "type")]
    pub kind: MaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default = "default_true")]
    pub visible: bool,
    pub shape: MaskShape,
    pub stroke: String,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// 1行ずつ全幅キャプション
    Full,
    /// 全行を1つの吹き出しにまとめる
    Box,
}

/// 編集対象のページ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub image_path: String,
    pub file_name: String,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default)]
    pub text_objects: Vec<TextObject>,
    #[serde(default)]
    pub masks: Vec<MaskObject>,
    #[serde(default)]
    pub is_local_style: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_style: Option<TextStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_mode: Option<ImportMode>,
    #[serde(default = "default_true")]
    pub auto_layout: bool,
}

impl Page {
    /// ページ個別スタイルが有効ならそれを、なければグローバルを返す
    pub fn effective_style<'a>(&'a self, global: &'a TextStyle) -> &'a TextStyle {
        match (&self.local_style, self.is_local_style) {
            (Some(local), true) => local,
            _ => global,
        }
    }

    pub fn effective_import_mode(&self, global: ImportMode) -> ImportMode {
        self.import_mode.unwrap_or(global)
    }

    /// プレビュー幅に合わせたキャンバスサイズ（アスペクト比維持）
    pub fn preview_canvas(&self, preview_width: f64) -> (f64, f64) {
        if self.image_width == 0 {
            return (preview_width, preview_width);
        }
        let ratio = self.image_height as f64 / self.image_width as f64;
        (preview_width, preview_width * ratio)
    }
}

/// ページ追加時の入力
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPage {
    pub image_path: String,
    pub file_name: String,
    pub image_width: u32,
    pub image_height: u32,
}

/// エディタ全体の状態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub pages: Vec<Page>,
    pub hide_labels: bool,
    pub import_mode: ImportMode,
    pub selected_page_id: Option<String>,
    pub selected_text_id: Option<String>,
    pub selected_mask_id: Option<String>,
    pub is_gallery_view: bool,
    pub global_style: TextStyle,
    #[serde(default)]
    pub saved_styles: Vec<SavedStyle>,
    #[serde(default = "default_preview_width")]
    pub preview_width: f64,
}

fn default_preview_width() -> f64 {
    DEFAULT_PREVIEW_WIDTH
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            hide_labels: false,
            import_mode: ImportMode::Full,
            selected_page_id: None,
            selected_text_id: None,
            selected_mask_id: None,
            is_gallery_view: true,
            global_style: TextStyle::default(),
            saved_styles: Vec::new(),
            preview_width: DEFAULT_PREVIEW_WIDTH,
        }
    }
}

impl EditorState {
    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    /// 読み込み直後は一覧表示・選択なしから始める
    pub fn reset_view(&mut self) {
        self.is_gallery_view = true;
        self.selected_page_id = None;
        self.selected_text_id = None;
        self.selected_mask_id = None;
    }
}
