use std::borrow::Cow;

/// Target placeholder style for rendered statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style numbered placeholders like `$1`.
    Postgres,
    /// ODBC positional markers, a bare `?`.
    Odbc,
}

/// What a pass over statement text found outside literals and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaceholderScan {
    /// Number of bare `?` markers.
    pub markers: usize,
    /// Whether a `;` statement terminator appears.
    pub terminator: bool,
    /// Whether a `--` or `/* */` comment appears.
    pub comment: bool,
    /// Whether the text ends inside a quote, dollar quote or block comment.
    pub unclosed: bool,
}

/// Count `?` markers and detect `;` terminators and comments, skipping
/// quoted strings, quoted identifiers, comments and dollar-quoted bodies.
#[must_use]
pub fn scan_placeholders(sql: &str) -> PlaceholderScan {
    let mut scan = PlaceholderScan::default();
    let closed = walk(sql, |_, token| match token {
        Token::Marker => scan.markers += 1,
        Token::Terminator => scan.terminator = true,
        Token::Comment => scan.comment = true,
    });
    scan.unclosed = !closed;
    scan
}

/// Render the `?` markers of `sql` in the style the driver expects.
///
/// Postgres markers are numbered left to right starting at `$1`; ODBC text is
/// returned untouched. Markers inside literals and comments are never
/// rewritten. A `?` used as a jsonb operator is indistinguishable from a
/// marker, so filters aimed at Postgres must spell those operators as
/// functions (`jsonb_exists`).
#[must_use]
pub fn render_placeholders(sql: &str, style: PlaceholderStyle) -> Cow<'_, str> {
    if style == PlaceholderStyle::Odbc {
        return Cow::Borrowed(sql);
    }

    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut next = 1usize;
    walk(sql, |idx, token| {
        if token == Token::Marker {
            let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
            buf.push_str(&sql[copied..idx]);
            buf.push('$');
            buf.push_str(&next.to_string());
            next += 1;
            copied = idx + 1;
        }
    });

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Marker,
    Terminator,
    Comment,
}

#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// Returns false when the text ends inside a quote or block comment.
fn walk(sql: &str, mut on_token: impl FnMut(usize, Token)) -> bool {
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    on_token(idx, Token::Comment);
                    state = State::LineComment;
                    idx += 1;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    on_token(idx, Token::Comment);
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                b'?' => on_token(idx, Token::Marker),
                b';' => on_token(idx, Token::Terminator),
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // doubled quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }
    matches!(state, State::Normal | State::LineComment)
}

fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let mut idx = start + 1;
    // `$1` is a numbered parameter, not a quote tag
    if bytes.get(idx).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    while idx < bytes.len() && bytes[idx] != b'$' {
        let b = bytes[idx];
        if !(b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }
        idx += 1;
    }

    if idx < bytes.len() && bytes[idx] == b'$' {
        let tag = String::from_utf8(bytes[start + 1..idx].to_vec()).ok()?;
        Some((tag, idx))
    } else {
        None
    }
}

fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len() && bytes[idx + 1..end] == *tag.as_bytes() && bytes[end] == b'$'
}
