pub const DELIMITER: char = ',';

/// Split delimited text into trimmed cells, one row per line.
///
/// No quoting is understood: a cell containing the delimiter is split in two.
/// Empty input yields a single row holding one empty cell.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    text.trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| {
            line.split(DELIMITER)
                .map(|cell| cell.trim().to_string())
                .collect()
        })
        .collect()
}
