use crate::constants::MAX_HISTORY;
use crate::types::Page;

/// ページ集合のスナップショットによる undo/redo
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: Vec<Vec<Page>>,
    redo_stack: Vec<Vec<Page>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// 変更直前の状態を記録（redo は破棄）
    pub fn record(&mut self, pages: &[Page]) {
        self.undo_stack.push(pages.to_vec());
        if self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// 現在の状態と undo スタック先頭を入れ替える
    pub fn undo(&mut self, current: &mut Vec<Page>) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                self.redo_stack.push(std::mem::replace(current, previous));
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self, current: &mut Vec<Page>) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                self.undo_stack.push(std::mem::replace(current, next));
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
