use crate::schema::SalesRecord;
use unicode_normalization::UnicodeNormalization;

/// Reduces a spreadsheet header to a stable key: lowercase, accents stripped,
/// every run of characters outside `[a-z0-9]` folded into one underscore,
/// no leading or trailing underscore.
///
/// `"Preço Unitário (R$)"` becomes `"preco_unitario_r"`.
pub fn normalize_column_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for c in lowered.nfd().filter(|c| !is_combining_diacritic(*c)) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }

    out
}

// Combining Diacritical Marks block only; other marks fold to '_'.
fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Rewrites every column of `record` through [`normalize_column_name`].
/// Columns that collapse to the same key overwrite one another; the last one wins.
pub fn normalize_record(record: &SalesRecord) -> SalesRecord {
    record
        .iter()
        .map(|(column, value)| (normalize_column_name(column), value.clone()))
        .collect()
}
