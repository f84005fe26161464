//! Advance widths of the standard Helvetica fonts and width-aware line breaking.
//!
//! Widths come from the Adobe core font metrics, indexed by the WinAnsi byte
//! that [`encode_win_ansi`] produces for each character.

use textwrap::core::Fragment;
use textwrap::wrap_algorithms::wrap_first_fit;

use super::layout::Font;
use super::pdf::encode_win_ansi;

/// Helvetica advance widths by WinAnsi code, in 1/1000 em.
const HELVETICA: [u16; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667,
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

/// Helvetica-Bold advance widths by WinAnsi code, in 1/1000 em.
const HELVETICA_BOLD: [u16; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0,
    556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667,
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

/// Width of `text` in points when set in `font` at `size`.
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let table = match font {
        Font::Regular => &HELVETICA,
        Font::Bold => &HELVETICA_BOLD,
    };
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|byte| u32::from(table[usize::from(byte)]))
        .sum();
    units as f32 * size / 1000.0
}

/// A run of text placed on a line, followed by `gap` points of space.
#[derive(Debug)]
struct Piece<'a> {
    text: &'a str,
    width: f64,
    gap: f64,
}

impl Fragment for Piece<'_> {
    fn width(&self) -> f64 {
        self.width
    }

    fn whitespace_width(&self) -> f64 {
        self.gap
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

/// Break `text` into lines no wider than `width` points. Newlines are kept as
/// hard breaks and words wider than a whole line are split between characters.
pub fn wrap(text: &str, font: Font, size: f32, width: f32) -> Vec<String> {
    let text = text.replace('\r', "");
    let space = f64::from(text_width(" ", font, size));
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut pieces = Vec::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            split_word(word, font, size, width, space, &mut pieces);
        }

        if pieces.is_empty() {
            lines.push(String::new());
            continue;
        }

        for line in wrap_first_fit(&pieces, &[f64::from(width)]) {
            let mut out = String::new();
            for (i, piece) in line.iter().enumerate() {
                out.push_str(piece.text);
                if i + 1 < line.len() && piece.gap > 0.0 {
                    out.push(' ');
                }
            }
            lines.push(out);
        }
    }
    lines
}

/// Push `word` as one piece, or as several gapless pieces when it alone is
/// wider than `width`.
fn split_word<'a>(
    word: &'a str,
    font: Font,
    size: f32,
    width: f32,
    space: f64,
    pieces: &mut Vec<Piece<'a>>,
) {
    let word_width = text_width(word, font, size);
    if word_width <= width {
        pieces.push(Piece {
            text: word,
            width: f64::from(word_width),
            gap: space,
        });
        return;
    }

    let mut start = 0;
    let mut run = 0.0;
    for (pos, c) in word.char_indices() {
        let mut buf = [0u8; 4];
        let w = text_width(c.encode_utf8(&mut buf), font, size);
        if run + w > width && pos > start {
            pieces.push(Piece {
                text: &word[start..pos],
                width: f64::from(run),
                gap: 0.0,
            });
            start = pos;
            run = 0.0;
        }
        run += w;
    }
    pieces.push(Piece {
        text: &word[start..],
        width: f64::from(run),
        gap: space,
    });
}
