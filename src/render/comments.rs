/// Remove YAML comments from rendered output.
///
/// Full-line comments are dropped. An inline comment starts at a `#` that
/// follows whitespace outside a quoted scalar, so values such as
/// `host#frag` or `'NL #1'` survive. Blank lines are kept.
pub fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(strip_inline_comment)
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_inline_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some('"') if ch == '\\' => escaped = true,
            Some('\'') if ch == '\'' && line[i + 1..].starts_with('\'') => escaped = true,
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '#' if prev.is_some_and(char::is_whitespace) => return line[..i].trim_end(),
                '\'' | '"' if opens_scalar(prev) => quote = Some(ch),
                _ => {}
            },
        }
        prev = Some(ch);
    }
    line
}

/// A quote only opens a scalar at the start of a value, not inside `O'Brien`.
fn opens_scalar(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '[' | '{' | ','),
    }
}
