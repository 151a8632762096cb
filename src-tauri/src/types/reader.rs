use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Single,
    Double,
    Vertical,
}

impl ViewMode {
    /// 1回のページ送りで進む枚数（縦スクロールは送りなし）
    pub fn step(self) -> u32 {
        match self {
            ViewMode::Single => 1,
            ViewMode::Double => 2,
            ViewMode::Vertical => 0,
        }
    }
}

/// 作品の切り替え先で開くページ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStart {
    First,
    Last,
}

/// ナビゲーション結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NavOutcome {
    /// 同じ本の中でページが変わった
    Page { page: u32 },
    /// 縦スクロールで対象ページまでスクロールする
    ScrollTo { page: u32 },
    /// キュー内の隣の本へ移る
    #[serde(rename_all = "camelCase")]
    ChangeBook { book_id: String, start: ChapterStart },
    /// 端で次の本もない
    None,
}

/// フロントエンドに返すリーダー状態
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderView {
    pub book_id: String,
    pub title: String,
    pub total_pages: u32,
    pub current_page: u32,
    pub mode: ViewMode,
    pub zoom: f64,
}

/// ページ画像（base64 data URL）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageImage {
    pub page: u32,
    pub data_url: String,
}

/// 縦スクロール時の各ページの表示割合
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageVisibility {
    pub page: u32,
    pub ratio: f64,
}

/// ページ送りの結果と送り後の状態
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderStep {
    pub outcome: NavOutcome,
    pub view: ReaderView,
}
