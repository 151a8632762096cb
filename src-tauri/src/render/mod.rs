//! 書き出し用の配置計算
//!
//! 編集中のプレビュー幅と元画像の幅の比をスケールとし、px単位の値だけを
//! 拡大して元画像解像度で配置を再計算する。位置の%はそのまま使う。

pub mod export;
pub mod svg;

use crate::constants::LAYOUT_GAP;
use crate::editor::layout::{
    clamp_box, display_text, padded_box_size, stack_positions, BoxSize, Canvas, Point, TextMeasure,
};
use crate::types::{MaskKind, MaskShape, Page, TextStyle};

/// 書き出し解像度に配置済みのテキスト
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub position: Point,
    pub size: BoxSize,
    pub lines: Vec<String>,
    pub style: TextStyle,
}

/// 書き出し解像度に変換済みのマスク
#[derive(Debug, Clone, PartialEq)]
pub struct MaskPlacement {
    pub position: Point,
    pub size: BoxSize,
    pub fill: String,
    pub kind: MaskKind,
    pub shape: MaskShape,
    pub opacity: f64,
    pub stroke: String,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub masks: Vec<MaskPlacement>,
    pub texts: Vec<TextPlacement>,
}

pub fn export_scale(original_width: u32, preview_width: f64) -> f64 {
    if preview_width > 0.0 {
        original_width as f64 / preview_width
    } else {
        1.0
    }
}

/// ページを元画像解像度で配置する
pub fn plan_page(
    page: &Page,
    global_style: &TextStyle,
    hide_labels: bool,
    preview_width: f64,
    measure: &dyn TextMeasure,
) -> PagePlan {
    let scale = export_scale(page.image_width, preview_width);
    let canvas = Canvas {
        width: page.image_width as f64,
        height: page.image_height as f64,
    };
    let page_style = page.effective_style(global_style).scaled(scale);

    let visible: Vec<_> = page.text_objects.iter().filter(|o| o.visible).collect();
    let prepared: Vec<(Vec<String>, TextStyle, BoxSize)> = visible
        .iter()
        .map(|object| {
            let style = object.style.scaled(scale);
            let width = object.width * scale;
            let text = display_text(object, hide_labels);
            let lines = measure.wrap(&text, style.font_size, width);
            let size = padded_box_size(&text, &style, width, measure);
            (lines, style, size)
        })
        .collect();

    let positions: Vec<Point> = if page.auto_layout {
        let sizes: Vec<BoxSize> = prepared.iter().map(|(_, _, size)| *size).collect();
        stack_positions(
            &sizes,
            canvas,
            page_style.alignment,
            page_style.vertical_alignment,
            &page_style.padding,
            LAYOUT_GAP * scale,
        )
    } else {
        visible
            .iter()
            .map(|object| Point {
                x: object.x / 100.0 * canvas.width,
                y: object.y / 100.0 * canvas.height,
            })
            .collect()
    };

    let texts = prepared
        .into_iter()
        .zip(positions)
        .map(|((lines, style, size), position)| TextPlacement {
            position: clamp_box(position, size, canvas, &style.padding),
            size,
            lines,
            style,
        })
        .collect();

    let masks = page
        .masks
        .iter()
        .filter(|m| m.visible)
        .map(|mask| MaskPlacement {
            position: Point {
                x: mask.x / 100.0 * canvas.width,
                y: mask.y / 100.0 * canvas.height,
            },
            size: BoxSize {
                width: mask.width * scale,
                height: mask.height * scale,
            },
            fill: mask.fill.clone(),
            kind: mask.kind,
            shape: mask.shape,
            opacity: mask.opacity.unwrap_or(1.0),
            stroke: mask.stroke.clone(),
            stroke_width: mask.stroke_width * scale,
        })
        .collect();

    PagePlan {
        width: page.image_width,
        height: page.image_height,
        scale,
        masks,
        texts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::layout::EstimatedMetrics;
    use crate::types::{MaskObject, TextObject};

    fn text(id: &str, body: &str, width: f64) -> TextObject {
        TextObject {
            id: id.to_string(),
            original_text: body.to_string(),
            x: 12.5,
            y: 40.0,
            width,
            visible: true,
            style: TextStyle::default(),
        }
    }

    fn page(width: u32, height: u32, auto_layout: bool) -> Page {
        Page {
            id: "p1".to_string(),
            image_path: "/tmp/p1.png".to_string(),
            file_name: "p1.png".to_string(),
            image_width: width,
            image_height: height,
            text_objects: vec![
                text("a", "A: first line of dialogue", 300.0),
                text("b", "B: second", 200.0),
            ],
            masks: vec![MaskObject {
                id: "m".to_string(),
                x: 25.0,
                y: 50.0,
                width: 40.0,
                height: 20.0,
                fill: "#ffffff".to_string(),
                kind: MaskKind::Rect,
                opacity: Some(0.5),
                visible: true,
                shape: MaskShape::Ellipse,
                stroke: "#000000".to_string(),
                stroke_width: 1.5,
            }],
            is_local_style: false,
            local_style: None,
            import_mode: None,
            auto_layout,
        }
    }

    #[test]
    fn scaling_multiplies_pixels_and_keeps_arrangement() {
        let global = TextStyle::default();
        for auto_layout in [true, false] {
            let preview = plan_page(&page(800, 1200, auto_layout), &global, false, 800.0, &EstimatedMetrics);
            let native = plan_page(&page(1600, 2400, auto_layout), &global, false, 800.0, &EstimatedMetrics);
            assert_eq!(preview.scale, 1.0);
            assert_eq!(native.scale, 2.0);

            for (p, n) in preview.texts.iter().zip(&native.texts) {
                assert_eq!(n.style.font_size, p.style.font_size * 2.0);
                assert_eq!(n.style.padding, p.style.padding.scaled(2.0));
                assert_eq!(n.size.width, p.size.width * 2.0);
                assert_eq!(n.size.height, p.size.height * 2.0);
                assert_eq!(n.position.x, p.position.x * 2.0);
                assert_eq!(n.position.y, p.position.y * 2.0);
                assert_eq!(n.lines, p.lines);
            }

            let (pm, nm) = (&preview.masks[0], &native.masks[0]);
            assert_eq!(nm.size.width, pm.size.width * 2.0);
            assert_eq!(nm.stroke_width, 3.0);
            // %位置は解像度に依存しない
            assert_eq!(pm.position.x / 800.0, nm.position.x / 1600.0);
        }
    }

    #[test]
    fn preview_plan_matches_editor_layout() {
        let global = TextStyle::default();
        let mut p = page(800, 1200, true);
        crate::editor::layout::layout_page(
            &mut p,
            &global,
            Canvas { width: 800.0, height: 1200.0 },
            LAYOUT_GAP,
            false,
            &EstimatedMetrics,
        );
        let plan = plan_page(&p, &global, false, 800.0, &EstimatedMetrics);
        for (object, placed) in p.text_objects.iter().zip(&plan.texts) {
            assert!((object.x / 100.0 * 800.0 - placed.position.x).abs() < 1e-9);
            assert!((object.y / 100.0 * 1200.0 - placed.position.y).abs() < 1e-9);
        }
    }

    #[test]
    fn manual_positions_are_clamped_inside_canvas() {
        let global = TextStyle::default();
        let mut p = page(800, 1200, false);
        p.text_objects[0].x = 95.0;
        p.text_objects[0].y = 99.0;
        let plan = plan_page(&p, &global, false, 800.0, &EstimatedMetrics);
        let placed = &plan.texts[0];
        assert!(placed.position.x + placed.size.width <= 800.0 - 10.0 + 1e-9);
        assert!(placed.position.y + placed.size.height <= 1200.0 - 10.0 + 1e-9);
    }

    #[test]
    fn hidden_objects_are_skipped() {
        let global = TextStyle::default();
        let mut p = page(800, 1200, true);
        p.text_objects[1].visible = false;
        p.masks[0].visible = false;
        let plan = plan_page(&p, &global, true, 800.0, &EstimatedMetrics);
        assert_eq!(plan.texts.len(), 1);
        assert!(plan.masks.is_empty());
        assert!(!plan.texts[0].lines.concat().contains("A:"));
    }
}
