use std::fs::File;
use std::io::Read;
use std::path::Path;
use anyhow::{anyhow, Context, Result};
use zip::ZipArchive;

use crate::constants::PAGE_IMAGE_EXTENSIONS;
use crate::image_utils::{extension_of, mime_for_extension};

// ページとして扱うエントリか（隠しファイル・__MACOSX・画像以外は除外）
fn is_page_entry(name: &str) -> bool {
    let path = Path::new(name);
    let hidden = path.components().any(|c| {
        let part = c.as_os_str().to_string_lossy();
        part.starts_with('.') || part == "__MACOSX"
    });
    if hidden {
        return false;
    }
    PAGE_IMAGE_EXTENSIONS.contains(&extension_of(path).as_str())
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    ZipArchive::new(file).with_context(|| "failed to read zip archive")
}

fn sorted_page_names(archive: &mut ZipArchive<File>) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).with_context(|| "failed to read zip entry")?;
        if entry.is_file() && is_page_entry(entry.name()) {
            names.push(entry.name().to_string());
        }
    }
    names.sort_by(|a, b| natord::compare(a, b));
    Ok(names)
}

/// 自然順に並べたページのエントリ名
pub fn list_pages(path: &Path) -> Result<Vec<String>> {
    let mut archive = open_archive(path)?;
    sorted_page_names(&mut archive)
}

/// ページ画像（1始まり）の生バイトとMIMEタイプ
pub fn read_page(path: &Path, page: u32) -> Result<(Vec<u8>, &'static str)> {
    let mut archive = open_archive(path)?;
    let names = sorted_page_names(&mut archive)?;
    let name = page
        .checked_sub(1)
        .and_then(|i| names.get(i as usize))
        .ok_or_else(|| anyhow!("page {} not found in {}", page, path.display()))?;

    let mut entry = archive
        .by_name(name)
        .with_context(|| format!("failed to read zip entry {}", name))?;
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .with_context(|| "failed to read zip entry content")?;
    let mime = mime_for_extension(&extension_of(Path::new(name))).unwrap_or("application/octet-stream");
    Ok((bytes, mime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write_cbz(path: &Path, names: &[&str]) {
        let file = File::create(path).expect("create");
        let mut writer = ZipWriter::new(file);
        for name in names {
            writer.start_file(*name, FileOptions::default()).expect("start");
            writer.write_all(name.as_bytes()).expect("write");
        }
        writer.finish().expect("finish");
    }

    #[test]
    fn lists_images_in_natural_order_and_skips_junk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.cbz");
        write_cbz(
            &path,
            &[
                "ch/page10.jpg",
                "ch/page2.PNG",
                "ch/page1.jpg",
                "__MACOSX/ch/._page1.jpg",
                ".hidden/cover.jpg",
                "ch/.DS_Store",
                "ComicInfo.xml",
            ],
        );
        let pages = list_pages(&path).expect("list");
        assert_eq!(pages, vec!["ch/page1.jpg", "ch/page2.PNG", "ch/page10.jpg"]);
    }

    #[test]
    fn reads_page_by_one_based_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.cbz");
        write_cbz(&path, &["b.png", "a.jpg"]);

        let (bytes, mime) = read_page(&path, 1).expect("page 1");
        assert_eq!(bytes, b"a.jpg");
        assert_eq!(mime, "image/jpeg");
        let (_, mime) = read_page(&path, 2).expect("page 2");
        assert_eq!(mime, "image/png");
        assert!(read_page(&path, 0).is_err());
        assert!(read_page(&path, 3).is_err());
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.cbz");
        std::fs::write(&path, b"not a zip").expect("write");
        assert!(list_pages(&path).is_err());
    }
}
