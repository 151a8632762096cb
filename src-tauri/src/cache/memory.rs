use std::collections::{HashMap, VecDeque};

/// 配信済み表紙の data URL を作品IDごとに保持する（件数上限つき）
pub struct CoverMemoryCache {
    covers: HashMap<String, String>,
    // 先頭ほど長く参照されていない作品
    recent: VecDeque<String>,
    capacity: usize,
}

impl CoverMemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            covers: HashMap::new(),
            recent: VecDeque::new(),
            capacity,
        }
    }

    fn touch(&mut self, comic_id: &str) {
        self.recent.retain(|id| id != comic_id);
        self.recent.push_back(comic_id.to_string());
    }

    pub fn get(&mut self, comic_id: &str) -> Option<String> {
        let url = self.covers.get(comic_id).cloned()?;
        self.touch(comic_id);
        Some(url)
    }

    pub fn insert(&mut self, comic_id: String, data_url: String) {
        // 上限に達していたら一番長く表示されていない表紙を捨てる
        if !self.covers.contains_key(&comic_id) && self.covers.len() >= self.capacity {
            if let Some(stale) = self.recent.pop_front() {
                self.covers.remove(&stale);
            }
        }
        self.touch(&comic_id);
        self.covers.insert(comic_id, data_url);
    }

    /// 作品削除時に表紙を捨てる
    pub fn remove(&mut self, comic_id: &str) {
        if self.covers.remove(comic_id).is_some() {
            self.recent.retain(|id| id != comic_id);
        }
    }

    pub fn clear(&mut self) {
        self.covers.clear();
        self.recent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = CoverMemoryCache::new(2);
        cache.insert("a".into(), "A".into());
        cache.insert("b".into(), "B".into());
        assert_eq!(cache.get("a").as_deref(), Some("A"));
        // 既存の作品の差し替えでは追い出さない
        cache.insert("a".into(), "A2".into());
        cache.insert("c".into(), "C".into());
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a").as_deref(), Some("A2"));
        assert_eq!(cache.get("c").as_deref(), Some("C"));
    }

    #[test]
    fn remove_and_clear() {
        let mut cache = CoverMemoryCache::new(4);
        cache.insert("a".into(), "A".into());
        cache.insert("b".into(), "B".into());
        cache.remove("a");
        assert_eq!(cache.get("a"), None);
        cache.clear();
        assert_eq!(cache.get("b"), None);
    }
}
