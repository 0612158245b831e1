/// Extensions the migration treats as product images. Compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// Whether `ext` (without the dot) is one of [`IMAGE_EXTENSIONS`].
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// Remove a trailing recognised image extension; other suffixes are left alone.
pub fn strip_image_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if is_image_extension(ext) => stem,
        _ => name,
    }
}

/// Canonical lowercase form of an image file name used for catalog lookups.
///
/// Normalization steps:
/// - strip the image extension
/// - replace anything that is not ASCII alphanumeric or whitespace with a space
/// - collapse runs of whitespace and trim
/// - lowercase
pub fn normalize_file_name(name: &str) -> String {
    let replaced: String = strip_image_extension(name)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    replaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Leading word of the normalized name. Product codes lead descriptive file
/// names ("AFSTPU Standard.webp"), so this is the catalog search key.
pub fn match_token(name: &str) -> Option<String> {
    normalize_file_name(name)
        .split(' ')
        .next()
        .filter(|word| !word.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_from_parenthesised_variant() {
        assert_eq!(normalize_file_name("AFSTPU(STANDARD).webp"), "afstpu standard");
        assert_eq!(match_token("AFSTPU(STANDARD).webp").as_deref(), Some("afstpu"));
    }

    #[test]
    fn collapses_separators_and_whitespace() {
        assert_eq!(
            normalize_file_name("  FCU-400__wall   mounted .JPG"),
            "fcu 400 wall mounted"
        );
        assert_eq!(match_token("FCU-400__wall mounted.JPG").as_deref(), Some("fcu"));
    }

    #[test]
    fn only_image_extensions_are_stripped() {
        assert_eq!(strip_image_extension("ahu.v2.png"), "ahu.v2");
        assert_eq!(strip_image_extension("datasheet.pdf"), "datasheet.pdf");
        assert_eq!(strip_image_extension("no_extension"), "no_extension");
        assert_eq!(normalize_file_name("ahu.v2.png"), "ahu v2");
    }

    #[test]
    fn names_without_alphanumerics_have_no_token() {
        assert_eq!(match_token("(__).gif"), None);
        assert_eq!(match_token(".png"), None);
    }

    #[test]
    fn non_ascii_letters_become_separators() {
        assert_eq!(normalize_file_name("Kühlgerät.jpeg"), "k hlger t");
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(is_image_extension("WEBP"));
        assert!(is_image_extension("Jpeg"));
        assert!(!is_image_extension("txt"));
    }
}
