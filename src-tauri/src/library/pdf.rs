//! PDFのページ数取得とページ描画（mutool / pdftoppm を利用）

use std::fs;
use std::path::Path;
use std::process::Command;
use anyhow::{anyhow, Context, Result};
use tempfile::tempdir;

use crate::constants::{PDF_DPI_DESKTOP, PDF_DPI_MOBILE};

pub fn render_dpi() -> u32 {
    if cfg!(mobile) {
        PDF_DPI_MOBILE
    } else {
        PDF_DPI_DESKTOP
    }
}

fn command_exists(cmd: &str) -> bool {
    match Command::new(cmd).arg("-h").output() {
        Ok(_) => true,
        Err(err) => err.kind() != std::io::ErrorKind::NotFound,
    }
}

// "Pages:  12" の行からページ数を取り出す
fn parse_page_count(info: &str) -> Option<u32> {
    info.lines()
        .filter_map(|line| line.trim().strip_prefix("Pages:"))
        .find_map(|rest| rest.trim().parse().ok())
}

pub fn page_count(path: &Path) -> Result<u32> {
    let (cmd, args): (&str, &[&str]) = if command_exists("mutool") {
        ("mutool", &["info"])
    } else if command_exists("pdfinfo") {
        ("pdfinfo", &[])
    } else {
        return Err(anyhow!("pdf support requires mutool or pdfinfo (install mupdf or poppler)"));
    };

    let output = Command::new(cmd)
        .args(args)
        .arg(path)
        .output()
        .with_context(|| format!("failed to run {}", cmd))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("{} failed: {}", cmd, stderr.trim()));
    }
    parse_page_count(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| anyhow!("{} did not report a page count", cmd))
}

/// 1ページ（1始まり）をPNGに描画
pub fn render_page(path: &Path, page: u32, dpi: u32) -> Result<Vec<u8>> {
    let dir = tempdir().with_context(|| "failed to create temp dir for pdf")?;
    let out_path = dir.path().join("page.png");

    if command_exists("mutool") {
        let output = Command::new("mutool")
            .arg("draw")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-o")
            .arg(&out_path)
            .arg(path)
            .arg(page.to_string())
            .output()
            .with_context(|| "failed to run mutool draw")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("mutool draw failed: {}", stderr.trim()));
        }
    } else if command_exists("pdftoppm") {
        // -singlefile で page.png に出力される
        let output = Command::new("pdftoppm")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-singlefile")
            .arg(path)
            .arg(dir.path().join("page"))
            .output()
            .with_context(|| "failed to run pdftoppm")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("pdftoppm failed: {}", stderr.trim()));
        }
    } else {
        return Err(anyhow!(
            "pdf rendering requires mutool or pdftoppm (install mupdf or poppler)"
        ));
    }

    fs::read(&out_path).with_context(|| "failed to read rendered pdf page")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_count_from_tool_output() {
        let mutool = "input.pdf:\n\nPDF-1.7\nInfo object (12 0 R):\nPages: 24\n";
        assert_eq!(parse_page_count(mutool), Some(24));
        let pdfinfo = "Producer:       x\nPages:          3\nEncrypted:      no\n";
        assert_eq!(parse_page_count(pdfinfo), Some(3));
        assert_eq!(parse_page_count("no pages here"), None);
    }

    #[test]
    fn desktop_builds_use_higher_dpi() {
        assert_eq!(render_dpi(), PDF_DPI_DESKTOP);
    }
}
