//! 貼り付けられた台本テキストの解析
//!
//! 形式: `Page <N> - <話者>: <セリフ>, <話者>: <セリフ>, ...` をページごとに繰り返す。
//! エスケープはなく、コロンを含む話者名は誤って分割される。

use std::collections::BTreeMap;
use std::sync::OnceLock;
use regex::Regex;

// 話者名: 文字・数字・空白・_ . ' -
const SPEAKER: &str = r"[\p{L}\p{N}_][\p{L}\p{N}_ .'\-]*:";

fn page_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bpage\s*(\d+)\s*-\s*").expect("page marker regex"))
}

fn speaker_split() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r",\s*{}", SPEAKER)).expect("speaker split regex"))
}

fn leading_page() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*page\s*\d+\s*-\s*").expect("leading page regex"))
}

fn leading_speaker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"^\s*{}\s*", SPEAKER)).expect("leading speaker regex"))
}

fn inner_speaker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r",\s*{}\s*", SPEAKER)).expect("inner speaker regex"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").expect("whitespace regex"))
}

/// ページ番号 -> セリフ一覧。マーカーがなければ空。
pub fn parse_raw_text(raw: &str) -> BTreeMap<u32, Vec<String>> {
    let mut result: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    let markers: Vec<_> = page_marker().captures_iter(raw).collect();

    for (i, caps) in markers.iter().enumerate() {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Ok(page) = number.as_str().parse::<u32>() else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(raw.len());

        let lines = split_dialogue(&raw[whole.end()..end]);
        if !lines.is_empty() {
            result.entry(page).or_default().extend(lines);
        }
    }

    result
}

/// `, 話者:` の直前のカンマで区切る
fn split_dialogue(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0;
    for m in speaker_split().find_iter(content) {
        lines.push(&content[start..m.start()]);
        // カンマの直後から次のセリフ
        start = m.start() + 1;
    }
    lines.push(&content[start..]);

    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// 表示用にページ番号と話者ラベルを取り除く（元テキストは変更しない）
pub fn strip_labels(text: &str) -> String {
    text.lines()
        .map(strip_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_line(line: &str) -> String {
    let without_page = leading_page().replace(line, "");
    let without_first = leading_speaker().replace(&without_page, "");
    let without_rest = inner_speaker().replace_all(&without_first, ", ");
    whitespace().replace_all(&without_rest, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pages_at_speaker_boundaries() {
        let parsed = parse_raw_text("Page 1 - A: hi, B: yo Page 2 - A: bye");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[&1], vec!["A: hi", "B: yo"]);
        assert_eq!(parsed[&2], vec!["A: bye"]);
    }

    #[test]
    fn commas_inside_dialogue_do_not_split() {
        let parsed = parse_raw_text("Page 3 - Ken: well, I think so, right? Mika: sure");
        assert_eq!(parsed[&3], vec!["Ken: well, I think so, right? Mika: sure"]);

        let parsed = parse_raw_text("Page 3 - Ken: well, I think so, Mika: sure");
        assert_eq!(parsed[&3], vec!["Ken: well, I think so", "Mika: sure"]);
    }

    #[test]
    fn embedded_word_colon_still_splits() {
        let parsed = parse_raw_text("Page 1 - A: She said, wait: no");
        assert_eq!(parsed[&1], vec!["A: She said", "wait: no"]);
    }

    #[test]
    fn input_without_markers_is_empty() {
        assert!(parse_raw_text("").is_empty());
        assert!(parse_raw_text("just some words, A: here").is_empty());
    }

    #[test]
    fn empty_pages_are_omitted_and_repeats_append() {
        let parsed = parse_raw_text("Page 1 - Page 2 - A: x\npage 2 - B: y");
        assert!(!parsed.contains_key(&1));
        assert_eq!(parsed[&2], vec!["A: x", "B: y"]);
    }

    #[test]
    fn strips_page_and_speaker_labels() {
        assert_eq!(strip_labels("Page 4 - A: hi, B:   yo"), "hi, yo");
        assert_eq!(strip_labels("Old Man: hello there"), "hello there");
        assert_eq!(strip_labels("A: one\nB: two"), "one\ntwo");
        assert_eq!(strip_labels("no label here"), "no label here");
    }
}
