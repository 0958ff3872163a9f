use crate::coords::ColorRgba;

use super::FontId;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Alignment {
    Center,
    #[default]
    Left,
    Right,
}

/// Style of one run of glyphs. Lengths are in NDC units.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSettings {
    /// Multiplier on the font's pixel-to-NDC scale.
    pub font_size: f32,
    pub color: [f32; 3],
    pub opacity: f32,
    pub line_height: f32,
    pub letter_space: f32,
    /// Extra advance before every space.
    pub word_space: f32,
    pub font_id: FontId,
    pub italic: bool,
}

impl TextSettings {
    /// Per-vertex color: RGB plus opacity.
    pub fn vertex_color(&self) -> ColorRgba {
        let [r, g, b] = self.color;
        ColorRgba::new(r, g, b, self.opacity)
    }
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            font_size: 0.03,
            color: [0.2; 3],
            opacity: 1.0,
            line_height: 0.04,
            letter_space: 0.001,
            word_space: 0.02,
            font_id: FontId::FIRST,
            italic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParaSettings {
    /// Upper bound on the block width; the document's right padding may shrink it.
    pub width: f32,
    pub text: TextSettings,
    pub alignment: Alignment,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub start_indent: f32,
    pub padding_left: f32,
    pub padding_right: f32,
    /// Carried with the paragraph; nothing paints it yet.
    pub background_color: ColorRgba,
}

impl Default for ParaSettings {
    fn default() -> Self {
        Self {
            width: 2.0,
            text: TextSettings::default(),
            alignment: Alignment::Left,
            padding_top: 0.01,
            padding_bottom: 0.01,
            start_indent: 0.01,
            padding_left: 0.01,
            padding_right: 0.01,
            background_color: ColorRgba::transparent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocSettings {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_left: f32,
    pub default_para: ParaSettings,
}

impl Default for DocSettings {
    fn default() -> Self {
        Self {
            width: 2.0,
            height: 2.0,
            margin_top: 0.01,
            margin_left: 0.01,
            default_para: ParaSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cascade_into_documents() {
        let doc = DocSettings::default();
        assert_eq!(doc.default_para.text.font_id, FontId::FIRST);
        assert_eq!(doc.default_para.alignment, Alignment::Left);
        assert_eq!(doc.default_para.text.line_height, 0.04);
    }

    #[test]
    fn vertex_color_merges_opacity() {
        let text = TextSettings {
            color: [1.0, 0.5, 0.0],
            opacity: 0.25,
            ..TextSettings::default()
        };
        assert_eq!(text.vertex_color(), ColorRgba::new(1.0, 0.5, 0.0, 0.25));
    }
}
