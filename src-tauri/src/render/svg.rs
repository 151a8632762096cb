//! 配置済みページをSVGに組み立ててラスタライズする

use std::sync::{Arc, OnceLock};
use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, RgbaImage};
use resvg::render;
use tiny_skia::Pixmap;
use usvg::{fontdb, Options, Tree};

use super::{MaskPlacement, PagePlan, TextPlacement};
use crate::constants::LINE_HEIGHT_RATIO;
use crate::types::{Alignment, BoxShape, MaskKind, MaskShape};

// 1行目のベースライン位置（フォントサイズ比）
const BASELINE_RATIO: f64 = 0.98;
const ROUNDED_RADIUS_RATIO: f64 = 0.2;

fn font_database() -> Arc<fontdb::Database> {
    static DB: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Arc::new(db)
    })
    .clone()
}

pub fn build_page_svg(plan: &PagePlan, background_data_url: &str) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = plan.width,
        h = plan.height
    ));
    svg.push_str(&format!(
        r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
        uri = background_data_url,
        w = plan.width,
        h = plan.height
    ));

    // マスクはテキストの下
    for mask in &plan.masks {
        push_mask(&mut svg, mask);
    }
    for (idx, text) in plan.texts.iter().enumerate() {
        push_text(&mut svg, idx, text);
    }

    svg.push_str("</svg>");
    svg
}

fn push_mask(svg: &mut String, mask: &MaskPlacement) {
    let (x, y) = (mask.position.x, mask.position.y);
    let (w, h) = (mask.size.width, mask.size.height);
    match mask.kind {
        MaskKind::Image => {
            svg.push_str(&format!(
                r#"<image href="{src}" xlink:href="{src}" x="{x}" y="{y}" width="{w}" height="{h}" opacity="{o}" preserveAspectRatio="none"/>"#,
                src = escape_xml(&mask.fill),
                o = mask.opacity,
            ));
        }
        MaskKind::Rect => {
            let stroke = stroke_attrs(&mask.stroke, mask.stroke_width);
            match mask.shape {
                MaskShape::Rect => svg.push_str(&format!(
                    r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}" opacity="{o}"{stroke}/>"#,
                    fill = escape_xml(&mask.fill),
                    o = mask.opacity,
                )),
                MaskShape::Ellipse => svg.push_str(&format!(
                    r#"<ellipse cx="{cx}" cy="{cy}" rx="{rx}" ry="{ry}" fill="{fill}" opacity="{o}"{stroke}/>"#,
                    cx = x + w / 2.0,
                    cy = y + h / 2.0,
                    rx = w / 2.0,
                    ry = h / 2.0,
                    fill = escape_xml(&mask.fill),
                    o = mask.opacity,
                )),
            }
        }
    }
}

fn stroke_attrs(color: &str, width: f64) -> String {
    if width > 0.0 {
        format!(r#" stroke="{}" stroke-width="{}""#, escape_xml(color), width)
    } else {
        String::new()
    }
}

fn push_text(svg: &mut String, idx: usize, text: &TextPlacement) {
    let style = &text.style;
    let (x, y) = (text.position.x, text.position.y);
    let (w, h) = (text.size.width, text.size.height);

    let fill = style
        .background_color
        .as_deref()
        .map(escape_xml)
        .unwrap_or_else(|| "none".to_string());
    match style.box_shape {
        BoxShape::None => {}
        BoxShape::Rect => svg.push_str(&format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}"/>"#
        )),
        BoxShape::Rounded => svg.push_str(&format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" rx="{r}" ry="{r}" fill="{fill}"/>"#,
            r = w.min(h) * ROUNDED_RADIUS_RATIO
        )),
        BoxShape::Oval => svg.push_str(&format!(
            r#"<ellipse cx="{cx}" cy="{cy}" rx="{rx}" ry="{ry}" fill="{fill}"/>"#,
            cx = x + w / 2.0,
            cy = y + h / 2.0,
            rx = w / 2.0,
            ry = h / 2.0
        )),
    }

    let mut filter_attr = String::new();
    if style.glow_blur > 0.0 && style.glow_opacity > 0.0 {
        let filter_id = format!("glow-{}", idx);
        svg.push_str(&format!(
            concat!(
                r#"<filter id="{id}" x="-50%" y="-50%" width="200%" height="200%">"#,
                r#"<feGaussianBlur in="SourceAlpha" stdDeviation="{sd}" result="blur"/>"#,
                r#"<feFlood flood-color="{color}" flood-opacity="{opacity}"/>"#,
                r#"<feComposite in2="blur" operator="in" result="glow"/>"#,
                r#"<feMerge><feMergeNode in="glow"/><feMergeNode in="SourceGraphic"/></feMerge>"#,
                r#"</filter>"#
            ),
            id = filter_id,
            sd = style.glow_blur / 2.0,
            color = escape_xml(&style.glow_color),
            opacity = style.glow_opacity
        ));
        filter_attr = format!(r#" filter="url(#{})""#, filter_id);
    }

    let content_width = w - style.padding.horizontal();
    let (anchor, text_x) = match style.text_align {
        Alignment::Left => ("start", x + style.padding.left),
        Alignment::Center => ("middle", x + style.padding.left + content_width / 2.0),
        Alignment::Right => ("end", x + style.padding.left + content_width),
    };
    let line_height = style.font_size * LINE_HEIGHT_RATIO;
    let baseline = y + style.padding.top + style.font_size * BASELINE_RATIO;

    let outline = if style.outline_width > 0.0 {
        format!(
            r#" stroke="{}" stroke-width="{}" stroke-linejoin="round" paint-order="stroke""#,
            escape_xml(&style.outline_color),
            style.outline_width
        )
    } else {
        String::new()
    };
    let weight = style
        .font_weight
        .as_deref()
        .map(|w| format!(r#" font-weight="{}""#, escape_xml(w)))
        .unwrap_or_default();

    svg.push_str(&format!(
        r#"<text x="{x}" y="{y}" font-size="{size}" font-family="{family}" fill="{color}" text-anchor="{anchor}"{weight}{outline}{filter}>"#,
        x = text_x,
        y = baseline,
        size = style.font_size,
        family = escape_xml(&style.font_family),
        color = escape_xml(&style.color),
        filter = filter_attr,
    ));
    for (i, line) in text.lines.iter().enumerate() {
        svg.push_str(&format!(
            r#"<tspan x="{x}" y="{y}">{text}</tspan>"#,
            x = text_x,
            y = baseline + line_height * i as f64,
            text = escape_xml(line)
        ));
    }
    svg.push_str("</text>");
}

/// SVGをRGBA画像にラスタライズ
pub fn rasterize(svg: &str) -> Result<DynamicImage> {
    let options = Options {
        fontdb: font_database(),
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty SVG size"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
    let image = RgbaImage::from_raw(size.width(), size.height(), pixmap.data().to_vec())
        .ok_or_else(|| anyhow!("failed to build image buffer from SVG"))?;
    Ok(DynamicImage::ImageRgba8(image))
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::layout::{BoxSize, Point};
    use crate::types::TextStyle;

    fn plan() -> PagePlan {
        let mut style = TextStyle::default();
        style.outline_width = 2.0;
        style.glow_blur = 6.0;
        style.glow_opacity = 0.8;
        PagePlan {
            width: 200,
            height: 300,
            scale: 1.0,
            masks: vec![MaskPlacement {
                position: Point { x: 10.0, y: 10.0 },
                size: BoxSize { width: 50.0, height: 20.0 },
                fill: "#ff0000".to_string(),
                kind: MaskKind::Rect,
                shape: MaskShape::Rect,
                opacity: 1.0,
                stroke: "#000000".to_string(),
                stroke_width: 0.0,
            }],
            texts: vec![TextPlacement {
                position: Point { x: 20.0, y: 40.0 },
                size: BoxSize { width: 160.0, height: 80.0 },
                lines: vec!["Tom & <Jerry>".to_string(), "second".to_string()],
                style,
            }],
        }
    }

    #[test]
    fn svg_contains_escaped_lines_masks_and_glow() {
        let svg = build_page_svg(&plan(), "data:image/png;base64,AAAA");
        assert!(svg.contains("Tom &amp; &lt;Jerry&gt;"));
        assert!(svg.contains(r##"<rect x="10" y="10" width="50" height="20" fill="#ff0000""##));
        assert!(svg.contains(r#"filter="url(#glow-0)""#));
        assert!(svg.contains(r#"paint-order="stroke""#));
        // マスクはテキストより先に描く
        assert!(svg.find("#ff0000").unwrap_or(usize::MAX) < svg.find("<text").unwrap_or(0));
        assert_eq!(svg.matches("<tspan").count(), 2);
    }

    #[test]
    fn rasterizes_to_plan_size() {
        let png = {
            let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(200, 300, image::Rgb([255, 255, 255])));
            let mut buf = std::io::Cursor::new(Vec::new());
            img.write_to(&mut buf, image::ImageFormat::Png).expect("png");
            buf.into_inner()
        };
        let uri = crate::image_utils::to_data_url("image/png", &png);
        let mut p = plan();
        p.texts.clear();
        let img = rasterize(&build_page_svg(&p, &uri)).expect("rasterize");
        assert_eq!((img.width(), img.height()), (200, 300));
        let rgba = img.to_rgba8();
        assert_eq!(rgba.get_pixel(20, 20).0[..3], [255, 0, 0]);
        assert_eq!(rgba.get_pixel(150, 250).0[..3], [255, 255, 255]);
    }
}
