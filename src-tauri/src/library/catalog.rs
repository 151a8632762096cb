//! ライブラリの作品・フォルダ管理

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::LibraryError;
use crate::image_utils::extension_of;
use crate::types::{ComicBook, ComicFormat, FileValidationResult, Folder, FolderContents, LibraryData};

// 自動整理のキー（先頭2語）
fn title_prefix(title: &str) -> Option<String> {
    let words: Vec<&str> = title.split_whitespace().take(2).collect();
    if words.len() < 2 {
        return None;
    }
    let prefix = words.join(" ");
    (prefix.chars().count() > 3).then_some(prefix)
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub struct Library {
    data: LibraryData,
}

impl Library {
    pub fn new(data: LibraryData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &LibraryData {
        &self.data
    }

    pub fn comic(&self, id: &str) -> Result<&ComicBook, LibraryError> {
        self.data
            .comics
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| LibraryError::ComicNotFound(id.to_string()))
    }

    fn comic_mut(&mut self, id: &str) -> Result<&mut ComicBook, LibraryError> {
        self.data
            .comics
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| LibraryError::ComicNotFound(id.to_string()))
    }

    fn folder(&self, id: &str) -> Result<&Folder, LibraryError> {
        self.data
            .folders
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| LibraryError::FolderNotFound(id.to_string()))
    }

    /// 作品を追加。未対応の拡張子と登録済みのパスは無視する。
    pub fn add_book(&mut self, path: &Path, folder_id: Option<&str>) -> Option<ComicBook> {
        let format = ComicFormat::from_extension(&extension_of(path))?;
        let file_path = path.to_string_lossy().to_string();
        if self.data.comics.iter().any(|c| c.file_path == file_path) {
            return None;
        }

        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.clone());
        let comic = ComicBook {
            id: new_id(),
            title,
            file_path,
            cover_path: None,
            format,
            total_pages: 0,
            last_read_page: 0,
            date_added: chrono::Utc::now().to_rfc3339(),
            folder_id: folder_id.map(str::to_string),
            missing: false,
        };
        self.data.comics.push(comic.clone());
        Some(comic)
    }

    pub fn add_books<P: AsRef<Path>>(&mut self, paths: &[P], folder_id: Option<&str>) -> Vec<ComicBook> {
        paths
            .iter()
            .filter_map(|p| self.add_book(p.as_ref(), folder_id))
            .collect()
    }

    /// 作品を削除（複数件の場合は確認必須）
    pub fn delete_books(&mut self, ids: &[String], confirmed: bool) -> Result<Vec<ComicBook>, LibraryError> {
        if ids.len() > 1 && !confirmed {
            return Err(LibraryError::ConfirmationRequired);
        }
        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.data.comics)
            .into_iter()
            .partition(|c| targets.contains(c.id.as_str()));
        self.data.comics = kept;
        Ok(removed)
    }

    pub fn move_to_folder(&mut self, comic_id: &str, folder_id: Option<&str>) -> Result<(), LibraryError> {
        if let Some(id) = folder_id {
            self.folder(id)?;
        }
        self.comic_mut(comic_id)?.folder_id = folder_id.map(str::to_string);
        Ok(())
    }

    pub fn set_total_pages(&mut self, comic_id: &str, total_pages: u32) -> Result<(), LibraryError> {
        self.comic_mut(comic_id)?.total_pages = total_pages;
        Ok(())
    }

    pub fn set_last_read(&mut self, comic_id: &str, page: u32) -> Result<(), LibraryError> {
        self.comic_mut(comic_id)?.last_read_page = page;
        Ok(())
    }

    pub fn set_cover(&mut self, comic_id: &str, cover_path: String) -> Result<(), LibraryError> {
        self.comic_mut(comic_id)?.cover_path = Some(cover_path);
        Ok(())
    }

    pub fn create_folder(&mut self, name: &str, parent_id: Option<&str>) -> Result<Folder, LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::EmptyName);
        }
        if let Some(id) = parent_id {
            self.folder(id)?;
        }
        let folder = Folder {
            id: new_id(),
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        };
        self.data.folders.push(folder.clone());
        Ok(folder)
    }

    pub fn rename_folder(&mut self, folder_id: &str, name: &str) -> Result<(), LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::EmptyName);
        }
        let folder = self
            .data
            .folders
            .iter_mut()
            .find(|f| f.id == folder_id)
            .ok_or_else(|| LibraryError::FolderNotFound(folder_id.to_string()))?;
        folder.name = name.to_string();
        Ok(())
    }

    // 自身と配下すべてのフォルダID
    fn subtree(&self, root: &str) -> HashSet<String> {
        let mut ids = HashSet::from([root.to_string()]);
        let mut stack = vec![root.to_string()];
        while let Some(current) = stack.pop() {
            for child in self.data.folders.iter().filter(|f| f.parent_id.as_deref() == Some(current.as_str())) {
                if ids.insert(child.id.clone()) {
                    stack.push(child.id.clone());
                }
            }
        }
        ids
    }

    /// フォルダを削除。中の作品とサブフォルダも再帰的に削除する。
    pub fn delete_folder(&mut self, folder_id: &str, confirmed: bool) -> Result<Vec<ComicBook>, LibraryError> {
        self.folder(folder_id)?;
        if !confirmed {
            return Err(LibraryError::ConfirmationRequired);
        }
        let doomed = self.subtree(folder_id);

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.data.comics)
            .into_iter()
            .partition(|c| c.folder_id.as_ref().is_some_and(|id| doomed.contains(id)));
        self.data.comics = kept;
        self.data.folders.retain(|f| !doomed.contains(&f.id));

        tracing::info!(folder = folder_id, folders = doomed.len(), comics = removed.len(), "フォルダを削除");
        Ok(removed)
    }

    /// 新しい親フォルダを作り、選択フォルダをその下へ移す
    pub fn group_folders(&mut self, name: &str, folder_ids: &[String]) -> Result<Folder, LibraryError> {
        let first = folder_ids
            .first()
            .ok_or_else(|| LibraryError::FolderNotFound(String::new()))?;
        for id in folder_ids {
            self.folder(id)?;
        }
        let parent_id = self.folder(first)?.parent_id.clone();

        // 新しい親が選択フォルダ自身の配下にあると循環する
        if let Some(parent) = parent_id.as_deref() {
            for id in folder_ids {
                if self.subtree(id).contains(parent) {
                    return Err(LibraryError::FolderCycle(id.clone()));
                }
            }
        }

        let group = self.create_folder(name, parent_id.as_deref())?;
        for folder in self.data.folders.iter_mut().filter(|f| folder_ids.contains(&f.id)) {
            folder.parent_id = Some(group.id.clone());
        }
        Ok(group)
    }

    /// 未分類の作品をタイトル先頭2語でまとめる（2冊以上あるものだけ）
    pub fn auto_organize(&mut self) -> Result<Vec<Folder>, LibraryError> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for comic in self.data.comics.iter().filter(|c| c.folder_id.is_none()) {
            if let Some(prefix) = title_prefix(&comic.title) {
                groups.entry(prefix).or_default().push(comic.id.clone());
            }
        }

        let mut touched = Vec::new();
        for (prefix, ids) in groups.into_iter().filter(|(_, ids)| ids.len() >= 2) {
            let existing = self
                .data
                .folders
                .iter()
                .find(|f| f.parent_id.is_none() && f.name == prefix)
                .cloned();
            let folder = match existing {
                Some(folder) => folder,
                None => self.create_folder(&prefix, None)?,
            };
            for comic in self.data.comics.iter_mut().filter(|c| ids.contains(&c.id)) {
                comic.folder_id = Some(folder.id.clone());
            }
            tracing::debug!(folder = %folder.name, comics = ids.len(), "自動整理");
            touched.push(folder);
        }
        Ok(touched)
    }

    /// タイトルの部分一致検索（大文字小文字は無視）
    pub fn search(&self, query: &str) -> Vec<ComicBook> {
        let needle = query.trim().to_lowercase();
        let mut hits: Vec<ComicBook> = self
            .data
            .comics
            .iter()
            .filter(|c| needle.is_empty() || c.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| natord::compare(&a.title, &b.title));
        hits
    }

    /// ルートからのフォルダパス
    pub fn breadcrumbs(&self, folder_id: &str) -> Result<Vec<Folder>, LibraryError> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(folder_id.to_string());
        while let Some(id) = current {
            if !seen.insert(id.clone()) {
                break;
            }
            let folder = self.folder(&id)?;
            current = folder.parent_id.clone();
            path.push(folder.clone());
        }
        path.reverse();
        Ok(path)
    }

    /// フォルダ直下のサブフォルダと作品（どちらも自然順）
    pub fn folder_contents(&self, folder_id: Option<&str>) -> Result<FolderContents, LibraryError> {
        let breadcrumbs = match folder_id {
            Some(id) => self.breadcrumbs(id)?,
            None => Vec::new(),
        };

        let mut folders: Vec<Folder> = self
            .data
            .folders
            .iter()
            .filter(|f| f.parent_id.as_deref() == folder_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| natord::compare(&a.name, &b.name));

        let mut comics: Vec<ComicBook> = self
            .data
            .comics
            .iter()
            .filter(|c| c.folder_id.as_deref() == folder_id)
            .cloned()
            .collect();
        comics.sort_by(|a, b| natord::compare(&a.title, &b.title));

        Ok(FolderContents {
            folder_id: folder_id.map(str::to_string),
            breadcrumbs,
            folders,
            comics,
        })
    }

    /// ファイルの存在確認（missing フラグを更新）
    pub fn validate_files(&mut self) -> Vec<FileValidationResult> {
        self.data
            .comics
            .iter_mut()
            .map(|comic| {
                comic.missing = !Path::new(&comic.file_path).is_file();
                FileValidationResult {
                    comic_id: comic.id.clone(),
                    status: if comic.missing { "missing" } else { "found" }.to_string(),
                    file_path: comic.file_path.clone(),
                }
            })
            .collect()
    }

    /// 開く前の確認（参照切れなら開けない）
    pub fn ensure_openable(&self, comic_id: &str) -> Result<&ComicBook, LibraryError> {
        let comic = self.comic(comic_id)?;
        if comic.missing || !Path::new(&comic.file_path).is_file() {
            return Err(LibraryError::MissingFile(comic.file_path.clone()));
        }
        Ok(comic)
    }

    pub fn factory_reset(&mut self, confirmed: bool) -> Result<(), LibraryError> {
        if !confirmed {
            return Err(LibraryError::ConfirmationRequired);
        }
        self.data = LibraryData::default();
        Ok(())
    }
}
