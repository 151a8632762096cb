use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("ページが見つかりません: {0}")]
    PageNotFound(String),
    #[error("テキストが見つかりません: {0}")]
    TextNotFound(String),
    #[error("マスクが見つかりません: {0}")]
    MaskNotFound(String),
    #[error("保存スタイルが見つかりません: {0}")]
    StyleNotFound(String),
    #[error("無効なスタイル: {0}")]
    InvalidStyle(String),
    #[error("無効な値: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("作品が見つかりません: {0}")]
    ComicNotFound(String),
    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),
    #[error("ファイルが見つかりません: {0}")]
    MissingFile(String),
    #[error("この操作には確認が必要です")]
    ConfirmationRequired,
    #[error("フォルダを自身の配下には移動できません: {0}")]
    FolderCycle(String),
    #[error("フォルダ名が空です")]
    EmptyName,
    #[error("ライブラリの保存に失敗: {0}")]
    Store(String),
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("開いている本がありません")]
    NoSession,
    #[error("ページ番号が範囲外です: {page} (1-{total})")]
    PageOutOfRange { page: u32, total: u32 },
    #[error(transparent)]
    Library(#[from] LibraryError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Download failed")]
    Page(#[source] anyhow::Error),
    #[error("ZIP Export failed")]
    Zip(#[source] anyhow::Error),
}
