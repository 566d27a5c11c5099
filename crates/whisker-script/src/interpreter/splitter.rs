//! Comment stripping and block-aware statement splitting (spec §4.3).

const OPENERS: &[&str] = &["if", "while", "for", "function", "repeat"];
const CLOSERS: &[&str] = &["end", "until"];

/// Strips `--...` line comments and `--[[ ... ]]` block comments. Quote
/// state is tracked so `--` inside a string literal is left alone.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    let mut quote: Option<char> = None;
    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
            out.push(c);
            i += 1;
            continue;
        }
        if c == '-' && chars.get(i + 1) == Some(&'-') {
            if chars.get(i + 2) == Some(&'[') && chars.get(i + 3) == Some(&'[') {
                i += 4;
                while i < chars.len() && !(chars[i] == ']' && chars.get(i + 1) == Some(&']')) {
                    i += 1;
                }
                i += 2;
                continue;
            }
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

fn classify(word: &str) -> i32 {
    if OPENERS.contains(&word) {
        1
    } else if CLOSERS.contains(&word) {
        -1
    } else {
        0
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits comment-stripped source into top-level statements. A statement
/// boundary is a `\n` or `;` seen while not inside a string literal, not
/// inside `()`/`{}`/`[]`, and not inside an open block (opener/closer
/// keyword depth > 0).
pub fn split_statements(source: &str) -> Vec<String> {
    let stripped = strip_comments(source);
    let chars: Vec<char> = stripped.chars().collect();
    let mut statements = Vec::new();
    let mut buf = String::new();
    let mut quote: Option<char> = None;
    let mut bracket_depth: i32 = 0;
    let mut block_depth: i32 = 0;
    let mut i = 0;
    let mut word_start: Option<usize> = None;

    macro_rules! flush_word {
        ($end:expr) => {
            if let Some(start) = word_start.take() {
                let word: String = chars[start..$end].iter().collect();
                if bracket_depth == 0 {
                    block_depth += classify(&word);
                }
            }
        };
    }

    macro_rules! push_statement {
        () => {
            if !buf.trim().is_empty() {
                statements.push(buf.trim().to_string());
            }
            buf.clear();
        };
    }

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            buf.push(c);
            if c == '\\' && i + 1 < chars.len() {
                buf.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        if is_ident_char(c) {
            if word_start.is_none() {
                word_start = Some(i);
            }
            buf.push(c);
            i += 1;
            continue;
        }
        flush_word!(i);

        match c {
            '"' | '\'' => {
                quote = Some(c);
                buf.push(c);
            }
            '(' | '{' | '[' => {
                bracket_depth += 1;
                buf.push(c);
            }
            ')' | '}' | ']' => {
                bracket_depth -= 1;
                buf.push(c);
            }
            ';' | '\n' if bracket_depth == 0 && block_depth == 0 => {
                push_statement!();
            }
            _ => buf.push(c),
        }
        i += 1;
    }
    flush_word!(chars.len());
    push_statement!();
    statements
}
