// Russian -> Latin slug derivation for note titles.
//
// Deterministic: the same title always yields the same slug. Characters that
// have no Latin spelling are dropped, runs of whitespace and hyphens collapse
// into one hyphen.

/// Longest slug a note may carry.
pub const SLUG_MAX_LEN: usize = 100;

/// Latin spelling of a lowercase Cyrillic letter or typographic dash.
fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "yi",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        '–' | '—' | '‒' | '−' => "-",
        _ => return None,
    };
    Some(latin)
}

/// Turn a title into a URL-safe slug (lowercase ASCII, digits, `-`).
pub fn slugify(title: &str) -> String {
    let lowered = title
        .to_lowercase()
        .replace("&amp;", " and ")
        .replace('&', " and ");

    let mut slug = String::with_capacity(lowered.len());
    let mut in_separator = false;

    for c in lowered.chars() {
        if c == '-' || c.is_whitespace() {
            if !in_separator {
                slug.push('-');
                in_separator = true;
            }
            continue;
        }
        in_separator = false;

        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if let Some(latin) = transliterate(c) {
            slug.push_str(latin);
        }
    }

    // Everything left is ASCII, so byte truncation is char-safe.
    slug.truncate(SLUG_MAX_LEN);
    slug
}

/// Whether an explicitly supplied slug is well formed.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
