//! # Receipt Text Sanitizer
//!
//! Thermal printers render text from a single-byte code page. Anything outside
//! printable ASCII either prints as garbage or, for some control bytes, is
//! interpreted as a command. [`sanitize`] folds arbitrary Unicode text into the
//! set `0x20..=0x7E` plus `\n`.
//!
//! ## Passes
//!
//! | Step | What happens |
//! |------|--------------|
//! | substitute | typographic punctuation and symbols → ASCII spellings |
//! | strip | zero-width and bidi control characters vanish |
//! | fold | NFKD, the substitution table again on the decomposed text, then every other non-ASCII code point is dropped |
//! | lines | `\r\n` and `\r` → `\n`, tabs expand to 2-column stops |
//! | filter | only printable ASCII and `\n` remain |
//! | trim | spaces before a newline are removed |
//!
//! Every pass maps ASCII to ASCII without change except the last three, which
//! are themselves stable on their own output, so `sanitize` is idempotent.
//!
//! ```
//! use promptslip::sanitize::sanitize;
//!
//! assert_eq!(sanitize("café™ 50€ — ½ price"), "cafe (TM) 50 EUR -- 1/2 price");
//! ```

use unicode_normalization::UnicodeNormalization;

/// Tab stop interval in columns.
pub const TAB_WIDTH: usize = 2;

/// Characters replaced by an ASCII spelling, both before and after
/// decomposition (NFKD turns `⅙` into `1⁄6` and `℉` into `°F`).
const SUBSTITUTIONS: &[(char, &str)] = &[
    // Quotes
    ('\u{2018}', "'"),  // ‘
    ('\u{2019}', "'"),  // ’
    ('\u{201A}', "'"),  // ‚
    ('\u{201B}', "'"),  // ‛
    ('\u{2032}', "'"),  // ′
    ('\u{201C}', "\""), // “
    ('\u{201D}', "\""), // ”
    ('\u{201E}', "\""), // „
    ('\u{201F}', "\""), // ‟
    ('\u{2033}', "\""), // ″
    ('\u{00AB}', "<<"), // «
    ('\u{00BB}', ">>"), // »
    ('\u{2039}', "<"),  // ‹
    ('\u{203A}', ">"),  // ›
    // Dashes and hyphens
    ('\u{2014}', "--"), // —
    ('\u{2015}', "--"), // ―
    ('\u{2013}', "-"),  // –
    ('\u{2012}', "-"),  // ‒
    ('\u{2010}', "-"),  // ‐
    ('\u{2011}', "-"),  // non-breaking hyphen
    ('\u{2212}', "-"),  // −
    // Punctuation
    ('\u{2026}', "..."), // …
    ('\u{2022}', "*"),   // •
    ('\u{00B7}', "."),   // ·
    ('\u{2044}', "/"),   // ⁄
    // Spaces
    ('\u{00A0}', " "),
    ('\u{2007}', " "),
    ('\u{202F}', " "),
    ('\u{3000}', " "),
    // Fractions
    ('\u{00BC}', "1/4"),
    ('\u{00BD}', "1/2"),
    ('\u{00BE}', "3/4"),
    ('\u{2153}', "1/3"),
    ('\u{2154}', "2/3"),
    ('\u{2155}', "1/5"),
    ('\u{215B}', "1/8"),
    ('\u{215C}', "3/8"),
    ('\u{215D}', "5/8"),
    ('\u{215E}', "7/8"),
    // Symbols
    ('\u{00B0}', " deg"),
    ('\u{2122}', " (TM)"),
    ('\u{00AE}', " (R)"),
    ('\u{00A9}', "(C)"),
    ('\u{00A7}', "S"),
    ('\u{00B6}', "P"),
    ('\u{00D7}', "x"),
    ('\u{00F7}', "/"),
    ('\u{00B1}', "+/-"),
    ('\u{2264}', "<="),
    ('\u{2265}', ">="),
    ('\u{2260}', "!="),
    ('\u{2248}', "~"),
    // Currency
    ('\u{20AC}', " EUR"),
    ('\u{00A3}', " GBP"),
    ('\u{00A5}', " JPY"),
    ('\u{00A2}', "c"),
    ('\u{20B9}', " INR"),
    ('\u{20A9}', " KRW"),
    ('\u{20BD}', " RUB"),
    ('\u{20BF}', " BTC"),
    // Arrows
    ('\u{2192}', "->"),
    ('\u{2190}', "<-"),
    ('\u{2191}', "^"),
    ('\u{2193}', "v"),
    ('\u{2194}', "<->"),
    ('\u{21D2}', "=>"),
    ('\u{21D0}', "<="),
    ('\u{21D4}', "<=>"),
    // Letters NFKD leaves alone
    ('\u{00DF}', "ss"),
    ('\u{00E6}', "ae"),
    ('\u{00C6}', "AE"),
    ('\u{0153}', "oe"),
    ('\u{0152}', "OE"),
    ('\u{00F8}', "o"),
    ('\u{00D8}', "O"),
    ('\u{0142}', "l"),
    ('\u{0141}', "L"),
    ('\u{0111}', "d"),
    ('\u{0110}', "D"),
    ('\u{00F0}', "d"),
    ('\u{00DE}', "Th"),
    ('\u{00FE}', "th"),
];

/// Zero-width and bidirectional formatting characters. Removed outright.
fn is_invisible(ch: char) -> bool {
    matches!(
        ch,
        '\u{00AD}'               // soft hyphen
            | '\u{061C}'         // arabic letter mark
            | '\u{180E}'         // mongolian vowel separator
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FEFF}'
    )
}

fn substitution(ch: char) -> Option<&'static str> {
    SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == ch)
        .map(|(_, to)| *to)
}

/// Fold arbitrary text into printable ASCII plus `\n`.
///
/// ```
/// use promptslip::sanitize::sanitize;
///
/// assert_eq!(sanitize("A\u{00A0}B\u{200B}C"), "A BC");
/// assert_eq!(sanitize(""), "");
/// ```
pub fn sanitize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut substituted = String::with_capacity(text.len());
    for ch in text.chars() {
        if let Some(replacement) = substitution(ch) {
            substituted.push_str(replacement);
        } else if !is_invisible(ch) {
            substituted.push(ch);
        }
    }

    let mut folded = String::with_capacity(substituted.len());
    for ch in substituted.nfkd() {
        if ch.is_ascii() {
            folded.push(ch);
        } else if let Some(replacement) = substitution(ch) {
            folded.push_str(replacement);
        }
    }
    let expanded = expand_tabs(&normalize_newlines(&folded), TAB_WIDTH);
    let filtered: String = expanded
        .chars()
        .filter(|&c| c == '\n' || (' '..='~').contains(&c))
        .collect();

    trim_line_ends(&filtered)
}

/// Convert CRLF and lone CR to LF.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Expand tabs to the next multiple of `width` columns.
pub fn expand_tabs(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0;

    for ch in text.chars() {
        match ch {
            '\t' => {
                let pad = width - (column % width);
                out.extend(std::iter::repeat_n(' ', pad));
                column += pad;
            }
            '\n' => {
                out.push('\n');
                column = 0;
            }
            _ => {
                out.push(ch);
                column += 1;
            }
        }
    }
    out
}

/// Remove spaces that sit directly before a newline.
fn trim_line_ends(text: &str) -> String {
    let mut lines = text.split('\n').peekable();
    let mut out = String::with_capacity(text.len());

    while let Some(line) = lines.next() {
        if lines.peek().is_some() {
            out.push_str(line.trim_end_matches(' '));
            out.push('\n');
        } else {
            out.push_str(line);
        }
    }
    out
}
