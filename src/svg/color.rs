//! Color normalization.
//!
//! Every color found in markup is reduced to a lowercase 6-digit hex string
//! so that `#F00`, `red` and `rgb(255, 0, 0)` compare equal.

/// Values that never participate in variants.
const SKIPPED: &[&str] = &[
    "none",
    "currentcolor",
    "transparent",
    "inherit",
    "initial",
    "unset",
    "context-fill",
    "context-stroke",
];

/// Normalize a raw color value.
///
/// Returns `None` for values that are not recolorable (`none`, `currentColor`,
/// gradient references, CSS variables) and for anything that is not a color,
/// such as `fill="freeze"` on `<animate>`. Color functions without a hex form
/// are kept lowercased.
pub fn normalize_color(raw: &str) -> Option<String> {
    let value = raw.trim();
    let value = value
        .strip_suffix("!important")
        .map(str::trim_end)
        .unwrap_or(value);
    if value.is_empty() {
        return None;
    }

    let lower = value.to_ascii_lowercase();
    if SKIPPED.contains(&lower.as_str()) || lower.starts_with("url(") || lower.starts_with("var(") {
        return None;
    }

    if let Some(hex) = lower.strip_prefix('#') {
        return normalize_hex(hex);
    }

    if lower.starts_with("rgb") {
        if let Some(hex) = rgb_to_hex(&lower) {
            return Some(hex);
        }
        return Some(lower);
    }

    if let Some(hex) = named_color(&lower) {
        return Some(hex.to_string());
    }

    let is_color_function = COLOR_FUNCTIONS
        .iter()
        .any(|f| lower.strip_prefix(f).is_some_and(|rest| rest.starts_with('(')));
    is_color_function.then_some(lower)
}

const COLOR_FUNCTIONS: &[&str] = &["hsl", "hsla", "hwb", "lab", "lch", "oklab", "oklch", "color"];

fn normalize_hex(hex: &str) -> Option<String> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };
    // Opaque alpha collapses to plain rgb; translucent colors keep all eight digits.
    if expanded.len() == 8 && expanded.ends_with("ff") {
        return Some(format!("#{}", &expanded[..6]));
    }
    Some(format!("#{expanded}"))
}

fn rgb_to_hex(value: &str) -> Option<String> {
    let open = value.find('(')?;
    let close = value.rfind(')')?;
    let inner = value.get(open + 1..close)?;
    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    let (channels, alpha) = match parts.as_slice() {
        [r, g, b] => ([*r, *g, *b], None),
        [r, g, b, a] => ([*r, *g, *b], Some(*a)),
        _ => return None,
    };

    if let Some(alpha) = alpha {
        let opaque = match alpha.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? >= 100.0,
            None => alpha.parse::<f64>().ok()? >= 1.0,
        };
        if !opaque {
            return None;
        }
    }

    let mut out = String::from("#");
    for channel in channels {
        let v = match channel.strip_suffix('%') {
            Some(pct) => (pct.parse::<f64>().ok()? * 2.55).round(),
            None => channel.parse::<f64>().ok()?.round(),
        };
        out.push_str(&format!("{:02x}", v.clamp(0.0, 255.0) as u8));
    }
    Some(out)
}

fn named_color(name: &str) -> Option<&'static str> {
    NAMED_COLORS
        .binary_search_by(|(n, _)| (*n).cmp(name))
        .ok()
        .map(|i| NAMED_COLORS[i].1)
}

/// CSS named colors, sorted by name for binary search.
static NAMED_COLORS: &[(&str, &str)] = &[
    ("aliceblue", "#f0f8ff"),
    ("antiquewhite", "#faebd7"),
    ("aqua", "#00ffff"),
    ("aquamarine", "#7fffd4"),
    ("azure", "#f0ffff"),
    ("beige", "#f5f5dc"),
    ("bisque", "#ffe4c4"),
    ("black", "#000000"),
    ("blanchedalmond", "#ffebcd"),
    ("blue", "#0000ff"),
    ("blueviolet", "#8a2be2"),
    ("brown", "#a52a2a"),
    ("burlywood", "#deb887"),
    ("cadetblue", "#5f9ea0"),
    ("chartreuse", "#7fff00"),
    ("chocolate", "#d2691e"),
    ("coral", "#ff7f50"),
    ("cornflowerblue", "#6495ed"),
    ("cornsilk", "#fff8dc"),
    ("crimson", "#dc143c"),
    ("cyan", "#00ffff"),
    ("darkblue", "#00008b"),
    ("darkcyan", "#008b8b"),
    ("darkgoldenrod", "#b8860b"),
    ("darkgray", "#a9a9a9"),
    ("darkgreen", "#006400"),
    ("darkgrey", "#a9a9a9"),
    ("darkkhaki", "#bdb76b"),
    ("darkmagenta", "#8b008b"),
    ("darkolivegreen", "#556b2f"),
    ("darkorange", "#ff8c00"),
    ("darkorchid", "#9932cc"),
    ("darkred", "#8b0000"),
    ("darksalmon", "#e9967a"),
    ("darkseagreen", "#8fbc8f"),
    ("darkslateblue", "#483d8b"),
    ("darkslategray", "#2f4f4f"),
    ("darkslategrey", "#2f4f4f"),
    ("darkturquoise", "#00ced1"),
    ("darkviolet", "#9400d3"),
    ("deeppink", "#ff1493"),
    ("deepskyblue", "#00bfff"),
    ("dimgray", "#696969"),
    ("dimgrey", "#696969"),
    ("dodgerblue", "#1e90ff"),
    ("firebrick", "#b22222"),
    ("floralwhite", "#fffaf0"),
    ("forestgreen", "#228b22"),
    ("fuchsia", "#ff00ff"),
    ("gainsboro", "#dcdcdc"),
    ("ghostwhite", "#f8f8ff"),
    ("gold", "#ffd700"),
    ("goldenrod", "#daa520"),
    ("gray", "#808080"),
    ("green", "#008000"),
    ("greenyellow", "#adff2f"),
    ("grey", "#808080"),
    ("honeydew", "#f0fff0"),
    ("hotpink", "#ff69b4"),
    ("indianred", "#cd5c5c"),
    ("indigo", "#4b0082"),
    ("ivory", "#fffff0"),
    ("khaki", "#f0e68c"),
    ("lavender", "#e6e6fa"),
    ("lavenderblush", "#fff0f5"),
    ("lawngreen", "#7cfc00"),
    ("lemonchiffon", "#fffacd"),
    ("lightblue", "#add8e6"),
    ("lightcoral", "#f08080"),
    ("lightcyan", "#e0ffff"),
    ("lightgoldenrodyellow", "#fafad2"),
    ("lightgray", "#d3d3d3"),
    ("lightgreen", "#90ee90"),
    ("lightgrey", "#d3d3d3"),
    ("lightpink", "#ffb6c1"),
    ("lightsalmon", "#ffa07a"),
    ("lightseagreen", "#20b2aa"),
    ("lightskyblue", "#87cefa"),
    ("lightslategray", "#778899"),
    ("lightslategrey", "#778899"),
    ("lightsteelblue", "#b0c4de"),
    ("lightyellow", "#ffffe0"),
    ("lime", "#00ff00"),
    ("limegreen", "#32cd32"),
    ("linen", "#faf0e6"),
    ("magenta", "#ff00ff"),
    ("maroon", "#800000"),
    ("mediumaquamarine", "#66cdaa"),
    ("mediumblue", "#0000cd"),
    ("mediumorchid", "#ba55d3"),
    ("mediumpurple", "#9370db"),
    ("mediumseagreen", "#3cb371"),
    ("mediumslateblue", "#7b68ee"),
    ("mediumspringgreen", "#00fa9a"),
    ("mediumturquoise", "#48d1cc"),
    ("mediumvioletred", "#c71585"),
    ("midnightblue", "#191970"),
    ("mintcream", "#f5fffa"),
    ("mistyrose", "#ffe4e1"),
    ("moccasin", "#ffe4b5"),
    ("navajowhite", "#ffdead"),
    ("navy", "#000080"),
    ("oldlace", "#fdf5e6"),
    ("olive", "#808000"),
    ("olivedrab", "#6b8e23"),
    ("orange", "#ffa500"),
    ("orangered", "#ff4500"),
    ("orchid", "#da70d6"),
    ("palegoldenrod", "#eee8aa"),
    ("palegreen", "#98fb98"),
    ("paleturquoise", "#afeeee"),
    ("palevioletred", "#db7093"),
    ("papayawhip", "#ffefd5"),
    ("peachpuff", "#ffdab9"),
    ("peru", "#cd853f"),
    ("pink", "#ffc0cb"),
    ("plum", "#dda0dd"),
    ("powderblue", "#b0e0e6"),
    ("purple", "#800080"),
    ("rebeccapurple", "#663399"),
    ("red", "#ff0000"),
    ("rosybrown", "#bc8f8f"),
    ("royalblue", "#4169e1"),
    ("saddlebrown", "#8b4513"),
    ("salmon", "#fa8072"),
    ("sandybrown", "#f4a460"),
    ("seagreen", "#2e8b57"),
    ("seashell", "#fff5ee"),
    ("sienna", "#a0522d"),
    ("silver", "#c0c0c0"),
    ("skyblue", "#87ceeb"),
    ("slateblue", "#6a5acd"),
    ("slategray", "#708090"),
    ("slategrey", "#708090"),
    ("snow", "#fffafa"),
    ("springgreen", "#00ff7f"),
    ("steelblue", "#4682b4"),
    ("tan", "#d2b48c"),
    ("teal", "#008080"),
    ("thistle", "#d8bfd8"),
    ("tomato", "#ff6347"),
    ("turquoise", "#40e0d0"),
    ("violet", "#ee82ee"),
    ("wheat", "#f5deb3"),
    ("white", "#ffffff"),
    ("whitesmoke", "#f5f5f5"),
    ("yellow", "#ffff00"),
    ("yellowgreen", "#9acd32"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_colors_sorted() {
        for pair in NAMED_COLORS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn test_hex_normalization() {
        assert_eq!(normalize_color("#FF0000").as_deref(), Some("#ff0000"));
        assert_eq!(normalize_color("#f00").as_deref(), Some("#ff0000"));
        assert_eq!(normalize_color(" #AbC ").as_deref(), Some("#aabbcc"));
        assert_eq!(normalize_color("#ff0000ff").as_deref(), Some("#ff0000"));
        assert_eq!(normalize_color("#ff000080").as_deref(), Some("#ff000080"));
        assert_eq!(normalize_color("#f00f").as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_named_and_functional() {
        assert_eq!(normalize_color("Red").as_deref(), Some("#ff0000"));
        assert_eq!(normalize_color("rebeccapurple").as_deref(), Some("#663399"));
        assert_eq!(normalize_color("rgb(255, 0, 0)").as_deref(), Some("#ff0000"));
        assert_eq!(normalize_color("rgba(0,0,255,1)").as_deref(), Some("#0000ff"));
        assert_eq!(normalize_color("rgb(100%, 0%, 0%)").as_deref(), Some("#ff0000"));
        assert_eq!(
            normalize_color("rgba(0,0,0,0.5)").as_deref(),
            Some("rgba(0,0,0,0.5)")
        );
    }

    #[test]
    fn test_skipped_values() {
        assert_eq!(normalize_color("none"), None);
        assert_eq!(normalize_color("currentColor"), None);
        assert_eq!(normalize_color("url(#grad1)"), None);
        assert_eq!(normalize_color("var(--fg)"), None);
        assert_eq!(normalize_color("   "), None);
    }

    #[test]
    fn test_non_colors_are_rejected() {
        assert_eq!(normalize_color("freeze"), None);
        assert_eq!(normalize_color("remove"), None);
        assert_eq!(normalize_color("#12345"), None);
        assert_eq!(normalize_color("#ggg"), None);
        assert_eq!(
            normalize_color("HSL(120, 100%, 50%)").as_deref(),
            Some("hsl(120, 100%, 50%)")
        );
    }

    #[test]
    fn test_important_suffix() {
        assert_eq!(normalize_color("#000 !important").as_deref(), Some("#000000"));
    }
}
