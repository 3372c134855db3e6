//! ffmpeg filter graph construction for image and caption overlays.

use reelcut_processing_core::animation::AnimationCurve;
use reelcut_project_model::geometry::Size;
use reelcut_project_model::overlay::TextLayout;

use crate::expr::{curve_expressions, enable_expr};

/// One image layered onto the host video.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayer {
    /// Size the image is scaled to (fits inside, aspect kept).
    pub size: Size,
    pub curve: AnimationCurve,
}

/// `filter_complex` overlaying `layers` onto input 0.
///
/// Layer `i` is expected as ffmpeg input `i + 1`. The last overlay is left
/// unlabeled so it becomes the graph output. Returns `None` for no layers.
pub fn build_image_overlay_graph(layers: &[ImageLayer]) -> Option<String> {
    if layers.is_empty() {
        return None;
    }

    let mut filters: Vec<String> = layers
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            format!(
                "[{input}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,format=yuva420p[img{i}]",
                input = i + 1,
                w = layer.size.width,
                h = layer.size.height,
            )
        })
        .collect();

    let mut current = "[0:v]".to_string();
    let last = layers.len() - 1;
    for (i, layer) in layers.iter().enumerate() {
        let (x, y) = curve_expressions(&layer.curve);
        let enable = enable_expr(&layer.curve.window);
        let mut overlay = format!("{current}[img{i}]overlay=x='{x}':y='{y}':enable='{enable}'");
        if i != last {
            let label = format!("[tmp{i}]");
            overlay.push_str(&label);
            current = label;
        }
        filters.push(overlay);
    }

    Some(filters.join(";"))
}

/// Named caption colors.
const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "0x000000"),
    ("white", "0xFFFFFF"),
    ("red", "0xFF0000"),
    ("green", "0x00FF00"),
    ("blue", "0x0000FF"),
    ("yellow", "0xFFFF00"),
    ("cyan", "0x00FFFF"),
    ("magenta", "0xFF00FF"),
    ("gray", "0x808080"),
    ("orange", "0xFFA500"),
    ("purple", "0x800080"),
    ("pink", "0xFFC0CB"),
];

const FALLBACK_COLOR: &str = "0x000000";

/// Convert a color name, `#RRGGBB` or `0xRRGGBB` to ffmpeg's `0xRRGGBB`.
///
/// Anything unrecognized becomes black.
pub fn parse_color(color: &str) -> String {
    let color = color.trim();
    let lower = color.to_ascii_lowercase();
    if let Some((_, hex)) = NAMED_COLORS.iter().find(|(name, _)| *name == lower) {
        return (*hex).to_string();
    }
    let hex = color
        .strip_prefix('#')
        .or_else(|| color.strip_prefix("0x"))
        .or_else(|| color.strip_prefix("0X"));
    if let Some(hex) = hex {
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return format!("0x{}", hex.to_ascii_uppercase());
        }
    }
    tracing::warn!(color, "Unrecognized color, defaulting to black");
    FALLBACK_COLOR.to_string()
}

/// Escape caption text for a single-quoted `drawtext` value.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\\\\\"),
            '\'' => out.push_str("\\'"),
            ':' => out.push_str("\\:"),
            _ => out.push(c),
        }
    }
    out
}

/// Caption styling.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    pub box_color: String,
    pub text_color: String,
    /// Box opacity in `[0, 1]`.
    pub box_opacity: f64,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            box_color: "black".to_string(),
            text_color: "white".to_string(),
            box_opacity: 0.7,
        }
    }
}

/// `-vf` chain drawing a bottom-centered box with the caption on top.
pub fn build_caption_filter(
    text: &str,
    layout: &TextLayout,
    bottom_margin: u32,
    style: &CaptionStyle,
) -> String {
    let bw = layout.box_width;
    let bh = layout.box_height;
    let box_color = parse_color(&style.box_color);
    let text_color = parse_color(&style.text_color);
    let opacity = style.box_opacity.clamp(0.0, 1.0);

    format!(
        "drawbox=x=(iw-{bw})/2:y=ih-{bh}-{m}:w={bw}:h={bh}:color={box_color}@{opacity}:t=fill,\
         drawtext=text='{text}':x=(w-text_w)/2:y=h-{half}-text_h/2-{m}:fontsize={fs}:fontcolor={text_color}",
        m = bottom_margin,
        half = bh / 2,
        fs = layout.font_size,
        text = escape_drawtext(text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use reelcut_processing_core::animation::AnimationCurveBuilder;
    use reelcut_project_model::overlay::{AnimationStyle, DisplayWindow};

    fn layer(start: f64, end: f64, style: AnimationStyle) -> ImageLayer {
        let frame = Size::new(1080, 1920);
        let size = Size::new(600, 400);
        let curve = AnimationCurveBuilder::default().build(
            DisplayWindow::new(start, end),
            style,
            frame,
            size,
            &mut StdRng::seed_from_u64(0),
        );
        ImageLayer { size, curve }
    }

    #[test]
    fn test_no_layers_no_graph() {
        assert!(build_image_overlay_graph(&[]).is_none());
    }

    #[test]
    fn test_single_layer_graph() {
        let graph = build_image_overlay_graph(&[layer(0.0, 2.0, AnimationStyle::Fade)]).unwrap();
        assert_eq!(
            graph,
            "[1:v]scale=600:400:force_original_aspect_ratio=decrease,format=yuva420p[img0];\
             [0:v][img0]overlay=x='240.000000':y='760.000000':enable='between(t,0.000,2.000)'"
        );
    }

    #[test]
    fn test_chain_labels() {
        let graph = build_image_overlay_graph(&[
            layer(0.0, 1.0, AnimationStyle::SlideBottom),
            layer(1.5, 2.5, AnimationStyle::SlideTop),
            layer(3.0, 4.0, AnimationStyle::SlideRight),
        ])
        .unwrap();
        assert!(graph.contains("[2:v]scale=600:400"));
        assert!(graph.contains("[3:v]scale=600:400"));
        assert!(graph.contains("[0:v][img0]overlay="));
        assert!(graph.contains("[tmp0][img1]overlay="));
        assert!(graph.contains("[tmp1][img2]overlay="));
        assert!(!graph.contains("[tmp2]"));
        assert_eq!(graph.split(';').count(), 6);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("white"), "0xFFFFFF");
        assert_eq!(parse_color("Red"), "0xFF0000");
        assert_eq!(parse_color("#12ab34"), "0x12AB34");
        assert_eq!(parse_color("0xABCDEF"), "0xABCDEF");
        assert_eq!(parse_color("chartreuse-ish"), "0x000000");
    }

    #[test]
    fn test_malformed_hex_falls_back_to_black() {
        assert_eq!(parse_color("#zz"), "0x000000");
        assert_eq!(parse_color("#12345"), "0x000000");
        assert_eq!(parse_color("#1234567"), "0x000000");
        assert_eq!(parse_color("0xGG0000"), "0x000000");
        assert_eq!(parse_color("#"), "0x000000");
    }

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("it's 5:30"), "it\\'s 5\\:30");
        assert_eq!(escape_drawtext("a\\b"), "a\\\\\\\\b");
        assert_eq!(escape_drawtext("plain"), "plain");
    }

    #[test]
    fn test_caption_filter() {
        let layout = TextLayout {
            font_size: 76,
            box_width: 952,
            box_height: 154,
        };
        let filter = build_caption_filter("Hello", &layout, 100, &CaptionStyle::default());
        assert_eq!(
            filter,
            "drawbox=x=(iw-952)/2:y=ih-154-100:w=952:h=154:color=0x000000@0.7:t=fill,\
             drawtext=text='Hello':x=(w-text_w)/2:y=h-77-text_h/2-100:fontsize=76:fontcolor=0xFFFFFF"
        );
    }
}
