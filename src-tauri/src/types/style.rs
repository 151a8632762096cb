use serde::{Deserialize, Serialize};

/// 上下左右の余白 (px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub fn uniform(value: f64) -> Self {
        Self { top: value, right: value, bottom: value, left: value }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            top: self.top * scale,
            right: self.right * scale,
            bottom: self.bottom * scale,
            left: self.left * scale,
        }
    }

    fn is_valid(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxShape {
    None,
    Rect,
    Rounded,
    Oval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    Top,
    Middle,
    Bottom,
}

/// テキストスタイル（グローバル / ページ個別 / オブジェクト個別で共通）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: f64,
    pub padding: Padding,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    pub box_shape: BoxShape,
    pub alignment: Alignment,
    pub vertical_alignment: VerticalAlignment,
    /// ボックス内の行揃え
    pub text_align: Alignment,
    pub outline_color: String,
    pub outline_width: f64,
    pub glow_color: String,
    pub glow_blur: f64,
    pub glow_opacity: f64,
    pub font_family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            padding: Padding::uniform(10.0),
            color: "#000000".to_string(),
            background_color: Some("#ffffff".to_string()),
            box_shape: BoxShape::Rounded,
            alignment: Alignment::Center,
            vertical_alignment: VerticalAlignment::Top,
            text_align: Alignment::Center,
            outline_color: "#ffffff".to_string(),
            outline_width: 0.0,
            glow_color: "#000000".to_string(),
            glow_blur: 0.0,
            glow_opacity: 0.0,
            font_family: "sans-serif".to_string(),
            font_weight: None,
        }
    }
}

impl TextStyle {
    /// 不変条件: 余白・サイズ系は非負、glowOpacity は [0,1]
    pub fn validate(&self) -> Result<(), String> {
        if !self.padding.is_valid() {
            return Err("padding must be non-negative".to_string());
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(format!("invalid font size: {}", self.font_size));
        }
        if !(self.outline_width.is_finite() && self.outline_width >= 0.0) {
            return Err(format!("invalid outline width: {}", self.outline_width));
        }
        if !(self.glow_blur.is_finite() && self.glow_blur >= 0.0) {
            return Err(format!("invalid glow blur: {}", self.glow_blur));
        }
        if !(0.0..=1.0).contains(&self.glow_opacity) {
            return Err(format!("glow opacity out of range: {}", self.glow_opacity));
        }
        Ok(())
    }

    /// px単位の値だけを拡大する（位置の%はスケール不要）
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            font_size: self.font_size * scale,
            padding: self.padding.scaled(scale),
            outline_width: self.outline_width * scale,
            glow_blur: self.glow_blur * scale,
            ..self.clone()
        }
    }
}

/// 名前付きで保存されたスタイル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStyle {
    pub name: String,
    pub style: TextStyle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_is_valid() {
        assert!(TextStyle::default().validate().is_ok());
    }

    #[test]
    fn rejects_negative_padding_and_bad_opacity() {
        let mut style = TextStyle::default();
        style.padding.left = -1.0;
        assert!(style.validate().is_err());

        let mut style = TextStyle::default();
        style.glow_opacity = 1.5;
        assert!(style.validate().is_err());
    }

    #[test]
    fn scaling_touches_only_pixel_values() {
        let mut style = TextStyle::default();
        style.outline_width = 2.0;
        style.glow_blur = 4.0;
        style.glow_opacity = 0.5;
        let scaled = style.scaled(3.0);
        assert_eq!(scaled.font_size, 72.0);
        assert_eq!(scaled.padding, Padding::uniform(30.0));
        assert_eq!(scaled.outline_width, 6.0);
        assert_eq!(scaled.glow_blur, 12.0);
        assert_eq!(scaled.glow_opacity, 0.5);
        assert_eq!(scaled.alignment, style.alignment);
    }
}
