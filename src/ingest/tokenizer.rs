/// One tokenized CSV record; fields carry no meaning yet.
pub type RawRow = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unquoted,
    Quoted,
}

/// Single-pass character state machine over the whole document.
///
/// - `"` opens a quoted section only as the first character of a field; anywhere
///   else while unquoted it is a literal.
/// - Inside quotes `""` is an escaped quote, any other `"` closes the section, and
///   commas and line breaks are literal.
/// - `\n`, `\r` and `\r\n` end a record.
///
/// Rows that are entirely blank are dropped.
pub fn tokenize(text: &str) -> Vec<RawRow> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut rows: Vec<RawRow> = Vec::new();
    let mut row: RawRow = Vec::new();
    let mut field = String::new();
    let mut state = State::Unquoted;
    // first character of the current field not yet consumed
    let mut at_field_start = true;
    // current row consumed anything at all (distinguishes `""` from nothing)
    let mut dirty = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match state {
            State::Quoted => {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        state = State::Unquoted;
                    }
                } else {
                    field.push(c);
                }
            }
            State::Unquoted => match c {
                '"' if at_field_start => {
                    state = State::Quoted;
                    at_field_start = false;
                    dirty = true;
                }
                ',' => {
                    row.push(std::mem::take(&mut field));
                    at_field_start = true;
                    dirty = true;
                }
                '\n' | '\r' => {
                    if c == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                    at_field_start = true;
                    dirty = false;
                }
                _ => {
                    field.push(c);
                    at_field_start = false;
                    dirty = true;
                }
            },
        }
    }

    // flush whatever the input ended on, including an unterminated quote
    if dirty || !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows.retain(|r| !is_blank(r));
    rows
}

fn is_blank(row: &RawRow) -> bool {
    match row.as_slice() {
        [] => true,
        [only] => only.trim().is_empty(),
        _ => false,
    }
}
