use serde::{Deserialize, Serialize};

// 書き出し結果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub output_path: String,
    pub page_count: usize,
}
