use csv::{ReaderBuilder, Trim};

/// Split one CSV line into trimmed fields.
///
/// Standard CSV quoting applies (`"b,c"` is one field, `""` is a literal
/// quote). A field still wrapped in a matching pair of quotes afterwards, as
/// with `'EURUSD'` or a padded `  "x"`, loses them. Trailing empty fields are
/// kept.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(strip_quotes).collect(),
        _ => line.split(',').map(|f| strip_quotes(f.trim())).collect(),
    }
}

fn strip_quotes(field: &str) -> String {
    ['\'', '"']
        .iter()
        .find_map(|q| field.strip_prefix(*q).and_then(|f| f.strip_suffix(*q)))
        .unwrap_or(field)
        .trim()
        .to_string()
}

/// Non-blank lines of a document with their 1-based physical line numbers.
pub fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| (i + 1, l))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_comma_stays_in_field() {
        assert_eq!(tokenize_line("a,\"b,c\",d"), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn test_keeps_trailing_empty_fields() {
        assert_eq!(tokenize_line("a,b,,"), vec!["a", "b", "", ""]);
    }

    #[test]
    fn test_trims_whitespace_and_single_quotes() {
        assert_eq!(tokenize_line(" 'EURUSD' ,  buy "), vec!["EURUSD", "buy"]);
    }

    #[test]
    fn test_quoted_number_with_thousands_separator() {
        assert_eq!(
            tokenize_line("NQ,\"1,250.50\",2"),
            vec!["NQ", "1,250.50", "2"]
        );
    }

    #[test]
    fn test_doubled_quotes_are_escapes() {
        assert_eq!(tokenize_line("\"say \"\"hi\"\"\",x"), vec!["say \"hi\"", "x"]);
    }

    #[test]
    fn test_padded_double_quoted_field() {
        assert_eq!(tokenize_line("a,  \"x\" ,b"), vec!["a", "x", "b"]);
    }

    #[test]
    fn test_blank_line_is_one_empty_field() {
        assert_eq!(tokenize_line(""), vec![""]);
    }

    #[test]
    fn test_numbered_lines_skip_blanks() {
        let lines: Vec<_> = numbered_lines("h\n\n a\r\nb\n").collect();
        assert_eq!(lines, vec![(1, "h"), (3, " a"), (4, "b")]);
    }
}
