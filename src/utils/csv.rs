/// Splits one CSV record, honouring double-quoted fields and `""` escapes.
pub fn parse_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    out.push(buf);
    out
}

/// Non-empty records with the 1-based line each starts on. A quoted field may
/// span several lines.
pub fn records(text: &str) -> impl Iterator<Item = (usize, Vec<String>)> + '_ {
    let mut lines = text.lines().enumerate();
    std::iter::from_fn(move || loop {
        let (idx, first) = lines.next()?;
        let mut record = first.trim_end_matches('\r').to_string();
        while has_open_quote(&record) {
            match lines.next() {
                Some((_, next)) => {
                    record.push('\n');
                    record.push_str(next.trim_end_matches('\r'));
                }
                None => break,
            }
        }
        if !record.trim().is_empty() {
            return Some((idx + 1, parse_record(&record)));
        }
    })
}

// `""` escapes add two quotes, so odd parity means a field is still open.
fn has_open_quote(record: &str) -> bool {
    record.chars().filter(|&c| c == '"').count() % 2 == 1
}

pub fn field(fields: &[String], idx: usize) -> &str {
    fields.get(idx).map(|s| s.trim()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_and_quoted_fields() {
        assert_eq!(parse_record("a,b,,c"), vec!["a", "b", "", "c"]);
        assert_eq!(
            parse_record(r#"radiobutton,"Pick one, please","say ""hi""",x"#),
            vec!["radiobutton", "Pick one, please", r#"say "hi""#, "x"]
        );
    }

    #[test]
    fn quoted_field_keeps_embedded_newline() {
        let text = "a,\"line one\nline two\",b\nc,d\n";
        let rows: Vec<_> = records(text).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 1);
        assert_eq!(rows[0].1, vec!["a", "line one\nline two", "b"]);
        assert_eq!(rows[1], (3, vec!["c".to_string(), "d".to_string()]));
    }

    #[test]
    fn records_skip_blank_lines_and_keep_line_numbers() {
        let text = "h1,h2\r\n\r\nv1,v2\n";
        let rows: Vec<_> = records(text).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].0, 3);
        assert_eq!(rows[1].1, vec!["v1", "v2"]);
    }
}
