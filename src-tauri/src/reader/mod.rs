//! リーダーのページ送り

use crate::constants::{MAX_ZOOM, MIN_ZOOM};
use crate::error::ReaderError;
use crate::library::Library;
use crate::types::{ChapterStart, ComicBook, NavOutcome, ReaderView, ViewMode};

/// 開いている1冊の閲覧状態
#[derive(Debug, Clone)]
pub struct ReaderSession {
    book_id: String,
    title: String,
    total_pages: u32,
    current_page: u32,
    mode: ViewMode,
    zoom: f64,
    // 前後の本を辿るための並び（フォルダ表示順）
    queue: Vec<String>,
}

impl ReaderSession {
    /// 前回の続き（lastReadPage）から開く
    pub fn open(book: &ComicBook, total_pages: u32, queue: Vec<String>, mode: ViewMode, start: Option<ChapterStart>) -> Self {
        let current_page = match start {
            Some(ChapterStart::First) => 1,
            Some(ChapterStart::Last) => total_pages.max(1),
            None => book.last_read_page.clamp(1, total_pages.max(1)),
        };
        Self {
            book_id: book.id.clone(),
            title: book.title.clone(),
            total_pages,
            current_page,
            mode,
            zoom: 1.0,
            queue,
        }
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn view(&self) -> ReaderView {
        ReaderView {
            book_id: self.book_id.clone(),
            title: self.title.clone(),
            total_pages: self.total_pages,
            current_page: self.current_page,
            mode: self.mode,
            zoom: self.zoom,
        }
    }

    fn neighbor(&self, offset: isize) -> Option<String> {
        let index = self.queue.iter().position(|id| *id == self.book_id)?;
        let target = index.checked_add_signed(offset)?;
        self.queue.get(target).cloned()
    }

    // 見開きは p と p+1 を表示するので、最終ページが見えていれば末尾
    fn at_end(&self) -> bool {
        match self.mode {
            ViewMode::Double => self.current_page + 1 >= self.total_pages,
            _ => self.current_page >= self.total_pages,
        }
    }

    pub fn next(&mut self) -> NavOutcome {
        let step = self.mode.step();
        if step == 0 {
            return NavOutcome::None;
        }
        if self.at_end() {
            return match self.neighbor(1) {
                Some(book_id) => NavOutcome::ChangeBook { book_id, start: ChapterStart::First },
                None => NavOutcome::None,
            };
        }
        self.current_page = (self.current_page + step).min(self.total_pages);
        NavOutcome::Page { page: self.current_page }
    }

    pub fn prev(&mut self) -> NavOutcome {
        let step = self.mode.step();
        if step == 0 {
            return NavOutcome::None;
        }
        if self.current_page <= 1 {
            return match self.neighbor(-1) {
                Some(book_id) => NavOutcome::ChangeBook { book_id, start: ChapterStart::Last },
                None => NavOutcome::None,
            };
        }
        self.current_page = self.current_page.saturating_sub(step).max(1);
        NavOutcome::Page { page: self.current_page }
    }

    /// ページ番号へ移動（縦スクロールはスクロール指示を返す）
    pub fn jump(&mut self, page: u32) -> Result<NavOutcome, ReaderError> {
        if page < 1 || page > self.total_pages {
            return Err(ReaderError::PageOutOfRange {
                page,
                total: self.total_pages,
            });
        }
        self.current_page = page;
        Ok(match self.mode {
            ViewMode::Vertical => NavOutcome::ScrollTo { page },
            _ => NavOutcome::Page { page },
        })
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom = if zoom.is_finite() { zoom.clamp(MIN_ZOOM, MAX_ZOOM) } else { 1.0 };
        self.zoom
    }

    /// 縦スクロール時、表示割合が最大のページを現在ページにする
    pub fn report_visibility(&mut self, ratios: &[(u32, f64)]) -> Option<u32> {
        if self.mode != ViewMode::Vertical {
            return None;
        }
        let (page, _) = ratios
            .iter()
            .filter(|(page, ratio)| (1..=self.total_pages).contains(page) && *ratio > 0.0)
            .fold(None::<(u32, f64)>, |best, &(page, ratio)| match best {
                Some((_, r)) if r >= ratio => best,
                _ => Some((page, ratio)),
            })?;
        if page == self.current_page {
            return None;
        }
        self.current_page = page;
        Some(page)
    }
}

/// 操作を適用し、ページが変わったら lastReadPage を書き戻す。
/// 書き戻せない場合はセッションを変えずにエラーを返す。戻り値の bool はページが変わったか。
pub fn apply_step<T>(
    session: &mut ReaderSession,
    library: &mut Library,
    apply: impl FnOnce(&mut ReaderSession) -> Result<T, ReaderError>,
) -> Result<(T, bool), ReaderError> {
    let mut next = session.clone();
    let value = apply(&mut next)?;
    let moved = next.current_page != session.current_page;
    if moved {
        library.set_last_read(&next.book_id, next.current_page)?;
    }
    *session = next;
    Ok((value, moved))
}

/// 削除された作品を開いていたらセッションを閉じる
pub fn close_if_removed(session: &mut Option<ReaderSession>, removed: &[ComicBook]) -> bool {
    let reading_removed = session
        .as_ref()
        .is_some_and(|s| removed.iter().any(|c| c.id == s.book_id));
    if reading_removed {
        *session = None;
    }
    reading_removed
}
