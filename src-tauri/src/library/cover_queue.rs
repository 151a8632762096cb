use std::collections::{HashSet, VecDeque};

/// 表紙抽出キュー（FIFO + 処理中1件）
#[derive(Debug, Default)]
pub struct CoverQueue {
    pending: VecDeque<String>,
    in_flight: Option<String>,
    // 抽出に失敗した本（再検証までは積み直さない）
    failed: HashSet<String>,
}

impl CoverQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既に待機中・処理中の本と失敗済みの本は積まない
    pub fn enqueue(&mut self, comic_id: String) -> bool {
        if self.in_flight.as_deref() == Some(comic_id.as_str())
            || self.pending.contains(&comic_id)
            || self.failed.contains(&comic_id)
        {
            return false;
        }
        self.pending.push_back(comic_id);
        true
    }

    /// 処理中が無ければ次のジョブを取り出す
    pub fn start_next(&mut self) -> Option<String> {
        if self.in_flight.is_some() {
            return None;
        }
        let next = self.pending.pop_front()?;
        self.in_flight = Some(next.clone());
        Some(next)
    }

    pub fn finish(&mut self, comic_id: &str) {
        if self.in_flight.as_deref() == Some(comic_id) {
            self.in_flight = None;
        }
    }

    /// 処理中のジョブを失敗として終える
    pub fn fail(&mut self, comic_id: &str) {
        self.finish(comic_id);
        self.failed.insert(comic_id.to_string());
    }

    pub fn clear_failures(&mut self) {
        self.failed.clear();
    }

    pub fn remove(&mut self, comic_id: &str) {
        self.pending.retain(|id| id != comic_id);
        self.failed.remove(comic_id);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.failed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_one_job_at_a_time_in_order() {
        let mut queue = CoverQueue::new();
        assert!(queue.enqueue("a".into()));
        assert!(queue.enqueue("b".into()));
        assert!(!queue.enqueue("a".into()));

        assert_eq!(queue.start_next().as_deref(), Some("a"));
        assert_eq!(queue.start_next(), None);
        assert!(!queue.enqueue("a".into()));

        queue.finish("a");
        assert_eq!(queue.start_next().as_deref(), Some("b"));
        queue.finish("b");
        assert_eq!(queue.start_next(), None);
    }

    #[test]
    fn failed_jobs_are_not_queued_again_until_cleared() {
        let mut queue = CoverQueue::new();
        queue.enqueue("broken".into());
        assert_eq!(queue.start_next().as_deref(), Some("broken"));
        queue.fail("broken");

        assert!(!queue.enqueue("broken".into()));
        assert_eq!(queue.start_next(), None);
        assert!(queue.enqueue("ok".into()));
        assert_eq!(queue.start_next().as_deref(), Some("ok"));
        queue.finish("ok");

        queue.clear_failures();
        assert!(queue.enqueue("broken".into()));
        assert_eq!(queue.start_next().as_deref(), Some("broken"));
    }

    #[test]
    fn removed_jobs_never_start() {
        let mut queue = CoverQueue::new();
        queue.enqueue("a".into());
        queue.enqueue("b".into());
        queue.remove("a");
        assert_eq!(queue.start_next().as_deref(), Some("b"));
    }
}
