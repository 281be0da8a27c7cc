// src/lcd.rs
//
// Text sanitization and frame encoding for the 16x2 character LCD behind the
// HC-05 link. The display controller only understands printable ASCII, so
// accented Spanish characters are folded to their base letters and anything
// else outside 0x20-0x7E is stripped.

/// Characters per LCD row.
pub const LCD_WIDTH: usize = 16;

/// Frame marker the firmware looks for before a display payload.
pub const LCD_FRAME_PREFIX: &str = "#:";

/// Closed substitution table for accented characters the LCD cannot render.
/// Spanish vowels with acute accent, enye and u with diaeresis.
const ACCENT_TABLE: &[(char, char)] = &[
    ('Á', 'A'),
    ('á', 'a'),
    ('É', 'E'),
    ('é', 'e'),
    ('Í', 'I'),
    ('í', 'i'),
    ('Ó', 'O'),
    ('ó', 'o'),
    ('Ú', 'U'),
    ('ú', 'u'),
    ('Ñ', 'N'),
    ('ñ', 'n'),
    ('Ü', 'U'),
    ('ü', 'u'),
];

fn fold_accent(c: char) -> char {
    ACCENT_TABLE
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

fn is_printable_ascii(c: char) -> bool {
    ('\u{20}'..='\u{7E}').contains(&c)
}

/// Fold accented characters to ASCII, then strip everything outside the
/// printable ASCII range. Idempotent: sanitizing a sanitized string is a
/// no-op.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(fold_accent)
        .filter(|c| is_printable_ascii(*c))
        .collect()
}

/// Characters in `text` that sanitization would alter or drop.
fn offending_chars(text: &str) -> Vec<char> {
    let mut chars: Vec<char> = text.chars().filter(|c| !is_printable_ascii(*c)).collect();
    chars.dedup();
    chars
}

/// Truncate to the LCD width, then right-pad with spaces to exactly 16 chars.
fn fit_row(text: &str) -> String {
    let mut row: String = text.chars().take(LCD_WIDTH).collect();
    while row.chars().count() < LCD_WIDTH {
        row.push(' ');
    }
    row
}

/// Validate both display lines and encode them into one outbound frame:
/// `#:<16 chars><16 chars>\n`.
///
/// Lines containing characters outside the printable ASCII range (including
/// accented characters the sanitizer would fold) are rejected with an error
/// naming the unsupported characters. The sanitized text is never sent in
/// their place.
pub fn encode_display(line1: &str, line2: &str) -> Result<String, String> {
    for (label, line) in [("line 1", line1), ("line 2", line2)] {
        if sanitize(line) != line {
            let offending: String = offending_chars(line)
                .into_iter()
                .map(|c| format!("'{}'", c))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(format!(
                "{} contains characters the LCD cannot display ({}). Remove accents, enye or other special characters.",
                label, offending
            ));
        }
    }

    Ok(format!(
        "{}{}{}\n",
        LCD_FRAME_PREFIX,
        fit_row(line1),
        fit_row(line2)
    ))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_folds_accents() {
        assert_eq!(sanitize("café"), "cafe");
        assert_eq!(sanitize("ÁÉÍÓÚ áéíóú Ññ Üü"), "AEIOU aeiou Nn Uu");
    }

    #[test]
    fn test_sanitize_strips_non_ascii() {
        // Inverted punctuation is outside the accent table: stripped, not
        // replaced.
        assert_eq!(sanitize("¡hola!"), "hola!");
        assert_eq!(sanitize("温度"), "");
    }

    #[test]
    fn test_sanitize_idempotent() {
        let once = sanitize("señal ¿fuerte?");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_sanitize_keeps_printable_ascii() {
        let text = " !~ Hello, World 123";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn test_encode_pads_to_width() {
        let frame = encode_display("Hola", "Mundo").unwrap();
        assert_eq!(frame, "#:Hola            Mundo           \n");
        assert_eq!(frame.len(), 2 + 16 + 16 + 1);
    }

    #[test]
    fn test_encode_truncates_long_lines() {
        let frame = encode_display("ABCDEFGHIJKLMNOPQRST", "").unwrap();
        assert_eq!(&frame[2..18], "ABCDEFGHIJKLMNOP");
    }

    #[test]
    fn test_encode_rejects_accented_input() {
        let err = encode_display("café", "ok").unwrap_err();
        assert!(err.contains("line 1"));
        assert!(err.contains("'é'"));
    }

    #[test]
    fn test_encode_rejects_second_line_too() {
        let err = encode_display("ok", "mañana").unwrap_err();
        assert!(err.contains("line 2"));
    }

    #[test]
    fn test_offending_chars_deduped() {
        let err = encode_display("ééé", "").unwrap_err();
        assert_eq!(err.matches('é').count(), 1);
    }
}
