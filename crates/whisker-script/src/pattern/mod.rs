//! Best-effort Lua-pattern-to-regex translation backing `string.find`,
//! `string.match` and `string.gsub` (spec §16 Open Question: Lua patterns
//! are not regular expressions, but most scripts only reach for character
//! classes, anchors and captures, all of which map cleanly onto `regex`).

use regex::Regex;

/// Translates a Lua pattern into an equivalent (or closest-effort) `regex`
/// pattern. `%b` balanced-match and `%f` frontier patterns have no regex
/// equivalent and are passed through literally, which will simply fail to
/// match rather than panic.
pub fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    if chars.first() == Some(&'^') {
        out.push('^');
        i = 1;
    }
    while i < chars.len() {
        let c = chars[i];
        match c {
            '%' if i + 1 < chars.len() => {
                i += 1;
                out.push_str(&class_to_regex(chars[i]));
            }
            '.' => out.push_str(r"(?s:.)"),
            '-' => out.push_str("*?"),
            '[' => {
                let (frag, consumed) = translate_set(&chars[i..]);
                out.push_str(&frag);
                i += consumed - 1;
            }
            '(' | ')' | '*' | '+' | '?' | '^' | '$' => out.push(c),
            _ => {
                if is_regex_meta(c) {
                    out.push('\\');
                }
                out.push(c);
            }
        }
        i += 1;
    }
    out
}

fn is_regex_meta(c: char) -> bool {
    matches!(c, '\\' | '|' | '{' | '}' | '$' | '^')
}

fn class_to_regex(c: char) -> String {
    match c {
        'a' => "[A-Za-z]".to_string(),
        'A' => "[^A-Za-z]".to_string(),
        'd' => "[0-9]".to_string(),
        'D' => "[^0-9]".to_string(),
        'l' => "[a-z]".to_string(),
        'L' => "[^a-z]".to_string(),
        'u' => "[A-Z]".to_string(),
        'U' => "[^A-Z]".to_string(),
        's' => r"\s".to_string(),
        'S' => r"\S".to_string(),
        'w' => "[A-Za-z0-9]".to_string(),
        'W' => "[^A-Za-z0-9]".to_string(),
        'p' => r"[[:punct:]]".to_string(),
        'c' => r"[[:cntrl:]]".to_string(),
        'x' => "[0-9A-Fa-f]".to_string(),
        other => regex::escape(&other.to_string()),
    }
}

/// Translates a `[...]` set, expanding `%x` classes nested inside it.
/// Returns the translated fragment and how many source chars it consumed.
fn translate_set(chars: &[char]) -> (String, usize) {
    let mut out = String::from("[");
    let mut i = 1;
    if chars.get(1) == Some(&'^') {
        out.push('^');
        i += 1;
    }
    while i < chars.len() {
        match chars[i] {
            ']' if i > 1 => {
                out.push(']');
                return (out, i + 1);
            }
            '%' if i + 1 < chars.len() => {
                i += 1;
                out.push_str(&class_to_regex(chars[i]));
            }
            c => out.push(c),
        }
        i += 1;
    }
    out.push(']');
    (out, chars.len())
}

pub struct Match {
    pub start: usize,
    pub end: usize,
    pub captures: Vec<String>,
}

pub fn find(text: &str, pattern: &str, init: usize) -> Option<Match> {
    let re = Regex::new(&translate(pattern)).ok()?;
    let hay = text.get(init..)?;
    let caps = re.captures(hay)?;
    let whole = caps.get(0)?;
    let captures = caps
        .iter()
        .skip(1)
        .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
        .collect();
    Some(Match {
        start: init + whole.start(),
        end: init + whole.end(),
        captures,
    })
}

/// Applies `repl` (a literal replacement string, `%0`/`%1`.. referring to
/// captures) up to `max` times (`usize::MAX` for "all").
pub fn gsub(text: &str, pattern: &str, repl: &str, max: usize) -> (String, usize) {
    let re = match Regex::new(&translate(pattern)) {
        Ok(re) => re,
        Err(_) => return (text.to_string(), 0),
    };
    let mut out = String::new();
    let mut last = 0;
    let mut count = 0;
    for caps in re.captures_iter(text) {
        if count >= max {
            break;
        }
        let whole = caps.get(0).unwrap();
        out.push_str(&text[last..whole.start()]);
        out.push_str(&expand_replacement(repl, &caps));
        last = whole.end();
        count += 1;
        if whole.start() == whole.end() {
            // Zero-width match: advance one char to avoid looping forever.
            if let Some(c) = text[last..].chars().next() {
                out.push(c);
                last += c.len_utf8();
            } else {
                break;
            }
        }
    }
    out.push_str(&text[last..]);
    (out, count)
}

fn expand_replacement(repl: &str, caps: &regex::Captures) -> String {
    let mut out = String::new();
    let mut chars = repl.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.next() {
                Some('0') => out.push_str(caps.get(0).map(|m| m.as_str()).unwrap_or("")),
                Some(d) if d.is_ascii_digit() => {
                    let idx = d.to_digit(10).unwrap() as usize;
                    out.push_str(caps.get(idx).map(|m| m.as_str()).unwrap_or(""));
                }
                Some('%') => out.push('%'),
                Some(other) => out.push(other),
                None => out.push('%'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_digit_and_word_classes() {
        assert_eq!(translate("%d+"), "[0-9]+");
        assert_eq!(translate("%w*"), "[A-Za-z0-9]*");
    }

    #[test]
    fn find_anchors_at_pattern_start() {
        let m = find("hello world", "^hello", 0).unwrap();
        assert_eq!((m.start, m.end), (0, 5));
        assert!(find("say hello", "^hello", 0).is_none());
    }

    #[test]
    fn find_returns_captures() {
        let m = find("key=value", "(%a+)=(%a+)", 0).unwrap();
        assert_eq!(m.captures, vec!["key".to_string(), "value".to_string()]);
    }

    #[test]
    fn gsub_replaces_every_digit_run() {
        let (out, count) = gsub("a1 b22 c333", "%d+", "#", usize::MAX);
        assert_eq!(out, "a# b# c#");
        assert_eq!(count, 3);
    }

    #[test]
    fn gsub_respects_max_count() {
        let (out, count) = gsub("a1 b2 c3", "%d", "#", 2);
        assert_eq!(out, "a# b# c3");
        assert_eq!(count, 2);
    }

    #[test]
    fn gsub_expands_capture_references() {
        let (out, _) = gsub("2026-07-31", "(%d+)%-(%d+)%-(%d+)", "%3/%2/%1", usize::MAX);
        assert_eq!(out, "31/07/2026");
    }

    #[test]
    fn gsub_on_zero_width_match_does_not_loop() {
        let (out, count) = gsub("abc", "x*", "-", usize::MAX);
        assert_eq!(count, 4);
        assert_eq!(out, "-a-b-c-");
    }

    #[test]
    fn set_translation_keeps_plain_ranges_intact() {
        assert_eq!(translate("[a-z]+"), "[a-z]+");
    }
}
