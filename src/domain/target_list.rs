// ClearLane target list: the prioritized enforcement locations
use serde::Serialize;

pub const PRIORITY_SCORE_COLUMN: &str = "ClearLane Priority Score";

/// ColorBrewer "Reds", light to dark.
const REDS: [(u8, u8, u8); 9] = [
    (0xff, 0xf5, 0xf0),
    (0xfe, 0xe0, 0xd2),
    (0xfc, 0xbb, 0xa1),
    (0xfc, 0x92, 0x72),
    (0xfb, 0x6a, 0x4a),
    (0xef, 0x3b, 0x2c),
    (0xcb, 0x18, 0x1d),
    (0xa5, 0x0f, 0x15),
    (0x67, 0x00, 0x0d),
];

/// Cells darker than this relative luminance get light text.
const TEXT_LUMINANCE_THRESHOLD: f64 = 0.408;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetRow {
    pub cells: Vec<String>,
    pub priority_score: f64,
    pub background: String,
    pub text_color: String,
}

/// The target list as published: every column kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetList {
    pub columns: Vec<String>,
    pub score_column: usize,
    pub rows: Vec<TargetRow>,
}

impl TargetList {
    /// `scores[i]` is the parsed priority score of `cells[i]`.
    pub fn new(columns: Vec<String>, score_column: usize, cells: Vec<Vec<String>>, scores: Vec<f64>) -> Self {
        let (min, max) = scores
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| (lo.min(*s), hi.max(*s)));

        let rows = cells
            .into_iter()
            .zip(scores)
            .map(|(cells, score)| {
                let rgb = gradient(normalize(score, min, max));
                TargetRow {
                    cells,
                    priority_score: score,
                    background: hex(rgb),
                    text_color: if relative_luminance(rgb) < TEXT_LUMINANCE_THRESHOLD {
                        "#f1f1f1".to_string()
                    } else {
                        "#000000".to_string()
                    },
                }
            })
            .collect();

        Self {
            columns,
            score_column,
            rows,
        }
    }
}

fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max > min {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Linear interpolation across the Reds stops for `t` in `[0, 1]`.
pub fn gradient(t: f64) -> (u8, u8, u8) {
    let scaled = t.clamp(0.0, 1.0) * (REDS.len() - 1) as f64;
    let lower = scaled.floor() as usize;
    let upper = (lower + 1).min(REDS.len() - 1);
    let frac = scaled - lower as f64;

    let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * frac).round() as u8;
    let (a, b) = (REDS[lower], REDS[upper]);
    (lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

fn relative_luminance((r, g, b): (u8, u8, u8)) -> f64 {
    let channel = |c: u8| {
        let c = f64::from(c) / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
}

fn hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}
