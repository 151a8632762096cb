//! テキストボックスの自動配置
//!
//! 表示中のボックスを揃え（左/中央/右、上/中/下）と余白に従って縦に積む。
//! 数値だけで完結し、描画バックエンドには依存しない。

use crate::constants::LINE_HEIGHT_RATIO;
use crate::editor::parser::strip_labels;
use crate::types::{Alignment, Padding, Page, TextObject, TextStyle, VerticalAlignment};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

/// テキストの寸法計測（描画層に委譲する部分）
pub trait TextMeasure {
    /// 幅に合わせて折り返した行
    fn wrap(&self, text: &str, font_size: f64, max_width: f64) -> Vec<String>;

    fn line_count(&self, text: &str, font_size: f64, max_width: f64) -> usize {
        self.wrap(text, font_size, max_width).len().max(1)
    }
}

/// 文字種ごとの概算幅で計測する
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedMetrics;

fn char_units(ch: char) -> f64 {
    if ch.is_whitespace() {
        0.25
    } else if ch.is_ascii_alphanumeric() {
        0.55
    } else if ch.is_ascii() {
        0.35
    } else if matches!(ch as u32, 0x4E00..=0x9FFF | 0x3040..=0x30FF | 0x31F0..=0x31FF | 0xFF00..=0xFFEF) {
        1.0
    } else {
        0.9
    }
}

pub fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().map(char_units).sum::<f64>() * font_size
}

impl TextMeasure for EstimatedMetrics {
    fn wrap(&self, text: &str, font_size: f64, max_width: f64) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            wrap_paragraph(paragraph, font_size, max_width, &mut lines);
        }
        lines
    }
}

// 単語単位で折り返し、幅を超える単語は文字単位で折る
fn wrap_paragraph(paragraph: &str, font_size: f64, max_width: f64, out: &mut Vec<String>) {
    let space = char_units(' ') * font_size;
    let mut line = String::new();
    let mut current = 0.0;

    for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
        let word_width = estimate_text_width(word, font_size);
        let lead = if line.is_empty() { 0.0 } else { space };
        if max_width <= 0.0 || current + lead + word_width <= max_width {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
            current += lead + word_width;
            continue;
        }
        if !line.is_empty() {
            out.push(std::mem::take(&mut line));
            current = 0.0;
        }
        if word_width <= max_width {
            line.push_str(word);
            current = word_width;
            continue;
        }
        for ch in word.chars() {
            let w = char_units(ch) * font_size;
            if !line.is_empty() && current + w > max_width {
                out.push(std::mem::take(&mut line));
                current = 0.0;
            }
            line.push(ch);
            current += w;
        }
    }

    out.push(line);
}

/// 表示上のテキスト（ラベル非表示モードならラベルを除去）
pub fn display_text(object: &TextObject, hide_labels: bool) -> String {
    if hide_labels {
        strip_labels(&object.original_text)
    } else {
        object.original_text.clone()
    }
}

/// 余白込みのボックス寸法
pub fn padded_box_size(
    text: &str,
    style: &TextStyle,
    width: f64,
    measure: &dyn TextMeasure,
) -> BoxSize {
    let lines = measure.line_count(text, style.font_size, width);
    let text_height = lines as f64 * style.font_size * LINE_HEIGHT_RATIO;
    BoxSize {
        width: width + style.padding.horizontal(),
        height: text_height + style.padding.vertical(),
    }
}

/// 積み上げ配置。返り値は各ボックスの左上 (px)。
pub fn stack_positions(
    boxes: &[BoxSize],
    canvas: Canvas,
    alignment: Alignment,
    vertical_alignment: VerticalAlignment,
    padding: &Padding,
    gap: f64,
) -> Vec<Point> {
    if boxes.is_empty() {
        return Vec::new();
    }

    let total_height = boxes.iter().map(|b| b.height + gap).sum::<f64>() - gap;
    let mut current_y = match vertical_alignment {
        VerticalAlignment::Top => padding.top,
        VerticalAlignment::Middle => canvas.height / 2.0 - total_height / 2.0,
        VerticalAlignment::Bottom => canvas.height - total_height - padding.bottom,
    };

    boxes
        .iter()
        .map(|b| {
            let x = match alignment {
                Alignment::Left => padding.left,
                Alignment::Center => canvas.width / 2.0 - b.width / 2.0,
                Alignment::Right => canvas.width - b.width - padding.right,
            };
            let point = Point { x, y: current_y };
            current_y += b.height + gap;
            point
        })
        .collect()
}

/// ページ上の表示中テキストを再配置し、位置を%で書き戻す
pub fn layout_page(
    page: &mut Page,
    global_style: &TextStyle,
    canvas: Canvas,
    gap: f64,
    hide_labels: bool,
    measure: &dyn TextMeasure,
) {
    if canvas.width <= 0.0 || canvas.height <= 0.0 {
        return;
    }
    let style = page.effective_style(global_style).clone();

    let visible: Vec<usize> = page
        .text_objects
        .iter()
        .enumerate()
        .filter(|(_, o)| o.visible)
        .map(|(i, _)| i)
        .collect();
    if visible.is_empty() {
        return;
    }

    let boxes: Vec<BoxSize> = visible
        .iter()
        .map(|&i| {
            let object = &page.text_objects[i];
            padded_box_size(&display_text(object, hide_labels), &object.style, object.width, measure)
        })
        .collect();

    let positions = stack_positions(
        &boxes,
        canvas,
        style.alignment,
        style.vertical_alignment,
        &style.padding,
        gap,
    );

    for (&i, point) in visible.iter().zip(positions) {
        let object = &mut page.text_objects[i];
        object.x = point.x / canvas.width * 100.0;
        object.y = point.y / canvas.height * 100.0;
    }
}

/// ボックスが余白内（無理ならキャンバス内）に収まるよう中心をクランプする
pub fn clamp_box(top_left: Point, size: BoxSize, canvas: Canvas, padding: &Padding) -> Point {
    let cx = clamp_center(
        top_left.x + size.width / 2.0,
        size.width,
        (padding.left, canvas.width - padding.right),
        canvas.width,
    );
    let cy = clamp_center(
        top_left.y + size.height / 2.0,
        size.height,
        (padding.top, canvas.height - padding.bottom),
        canvas.height,
    );
    Point {
        x: cx - size.width / 2.0,
        y: cy - size.height / 2.0,
    }
}

fn clamp_center(center: f64, extent: f64, (lo, hi): (f64, f64), full: f64) -> f64 {
    let half = extent / 2.0;
    if lo + half <= hi - half {
        return center.clamp(lo + half, hi - half);
    }
    if half <= full - half {
        return center.clamp(half, full - half);
    }
    full / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: Canvas = Canvas { width: 800.0, height: 1200.0 };

    fn sizes(heights: &[f64]) -> Vec<BoxSize> {
        heights.iter().map(|&h| BoxSize { width: 200.0, height: h }).collect()
    }

    #[test]
    fn stacked_boxes_never_overlap() {
        let boxes = sizes(&[40.0, 0.0, 125.5, 33.3, 80.0]);
        let padding = Padding::uniform(12.0);
        for alignment in [Alignment::Left, Alignment::Center, Alignment::Right] {
            for vertical in [VerticalAlignment::Top, VerticalAlignment::Middle, VerticalAlignment::Bottom] {
                let points = stack_positions(&boxes, CANVAS, alignment, vertical, &padding, 10.0);
                assert_eq!(points.len(), boxes.len());
                for i in 0..points.len() - 1 {
                    let min_next = points[i].y + boxes[i].height + 10.0;
                    assert!(points[i + 1].y >= min_next - 1e-9);
                }
            }
        }
    }

    #[test]
    fn vertical_origin_follows_alignment() {
        let boxes = sizes(&[100.0, 50.0]);
        let padding = Padding { top: 5.0, right: 7.0, bottom: 9.0, left: 3.0 };

        let top = stack_positions(&boxes, CANVAS, Alignment::Left, VerticalAlignment::Top, &padding, 10.0);
        assert_eq!(top[0], Point { x: 3.0, y: 5.0 });

        let middle = stack_positions(&boxes, CANVAS, Alignment::Center, VerticalAlignment::Middle, &padding, 10.0);
        assert_eq!(middle[0], Point { x: 300.0, y: 600.0 - 80.0 });

        let bottom = stack_positions(&boxes, CANVAS, Alignment::Right, VerticalAlignment::Bottom, &padding, 10.0);
        assert_eq!(bottom[0], Point { x: 800.0 - 200.0 - 7.0, y: 1200.0 - 160.0 - 9.0 });
        assert_eq!(bottom[1].y, 1200.0 - 9.0 - 50.0);
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let points = stack_positions(&[], CANVAS, Alignment::Center, VerticalAlignment::Top, &Padding::uniform(0.0), 10.0);
        assert!(points.is_empty());
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let m = EstimatedMetrics;
        // "aaaa" = 4 * 0.55 * 10 = 22px
        assert_eq!(m.line_count("aaaa aaaa", 10.0, 50.0), 1);
        assert_eq!(m.line_count("aaaa aaaa", 10.0, 30.0), 2);
        assert_eq!(m.line_count("a\nb", 10.0, 100.0), 2);
        // 1文字10pxの漢字が4文字で幅25 -> 2行
        assert_eq!(m.line_count("漫画漫画", 10.0, 25.0), 2);
        assert_eq!(m.wrap("aaaa aaaa aa", 10.0, 40.0), vec!["aaaa", "aaaa aa"]);
    }

    #[test]
    fn clamp_pulls_box_inside_padded_canvas() {
        let padding = Padding::uniform(10.0);
        let size = BoxSize { width: 100.0, height: 50.0 };

        let clamped = clamp_box(Point { x: 750.0, y: -40.0 }, size, CANVAS, &padding);
        assert_eq!(clamped, Point { x: 690.0, y: 10.0 });

        let inside = clamp_box(Point { x: 300.0, y: 300.0 }, size, CANVAS, &padding);
        assert_eq!(inside, Point { x: 300.0, y: 300.0 });

        // 余白込みでは収まらないがキャンバスには収まる
        let wide = BoxSize { width: 795.0, height: 50.0 };
        let clamped = clamp_box(Point { x: 200.0, y: 100.0 }, wide, CANVAS, &padding);
        assert!(clamped.x >= 0.0 && clamped.x + wide.width <= CANVAS.width);
    }
}
