use unicode_normalization::UnicodeNormalization;

/// Нормализация для индексации и поиска: lowercase + NFKC + срезание
/// комбинируемых диакритик. Применяется и к тексту, и к выражению.
pub fn normalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let nfkc = lower.nfkc().collect::<String>();
    strip_accents(&nfkc)
}

/// Токены — непрерывные последовательности буквенно-цифровых символов.
pub fn tokens(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn strip_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_mark(*c)).collect()
}

fn is_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
}
