//! Linux-safe filename sanitization.

/// Linux NAME_MAX in bytes.
pub(crate) const NAME_MAX: usize = 255;

/// Sanitizes a candidate filename for safe use on Linux.
///
/// Path separators, NUL, whitespace and control characters become `_`, runs of
/// `_` collapse, leading/trailing dots and underscores are trimmed and the
/// result is cut to NAME_MAX bytes on a char boundary.
pub fn sanitize_filename_for_linux(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let unsafe_char = matches!(c, '\0' | '/' | '\\') || c.is_control() || c.is_whitespace();
        if unsafe_char {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(c);
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut take = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_slash_and_backslash() {
        assert_eq!(sanitize_filename_for_linux("a/b\\c.swf"), "a_b_c.swf");
    }

    #[test]
    fn trims_dots_and_spaces() {
        assert_eq!(sanitize_filename_for_linux("  ..  game.swf  ..  "), "game.swf");
    }

    #[test]
    fn collapses_underscores_from_whitespace() {
        assert_eq!(sanitize_filename_for_linux("super  mario\t63.swf"), "super_mario_63.swf");
    }

    #[test]
    fn control_chars() {
        assert_eq!(sanitize_filename_for_linux("game\x00name.swf"), "game_name.swf");
    }

    #[test]
    fn long_names_cut_on_char_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_filename_for_linux(&long);
        assert!(out.len() <= NAME_MAX);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
