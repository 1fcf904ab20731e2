//! Lightweight JavaScript highlighter.
//!
//! A single left-to-right scan picks out comments and string literals; the plain code
//! between them gets a second pass that tags numeric literals and keywords. There is no
//! grammar behind it: a keyword used as a property name is still a keyword.
//!
//! Unterminated block comments run to the end of the input, while an unterminated
//! quote never forms a string and its text stays plain.

use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT_OR_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"//[^\n]*",
        r"|/\*[\s\S]*?(?:\*/|\z)",
        r"|`(?:\\[\s\S]|[^\\`])*`",
        r"|'(?:\\[^\n\r\x{2028}\x{2029}]|[^'\\])*'",
        r#"|"(?:\\[^\n\r\x{2028}\x{2029}]|[^"\\])*""#,
    ))
    .unwrap()
});

pub const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "export",
    "extends",
    "finally",
    "for",
    "function",
    "if",
    "import",
    "in",
    "instanceof",
    "let",
    "new",
    "return",
    "super",
    "switch",
    "this",
    "throw",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
    "yield",
    "await",
    "async",
    "null",
    "true",
    "false",
    "undefined",
];

// Group 1 is a number, group 2 a keyword.
static NUMBER_OR_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    let number = r"0x[0-9a-fA-F]+|[0-9]+(?:\.[0-9]+)?(?:e[+-]?[0-9]+)?";
    Regex::new(&format!(
        r"\b(?:({number})|({keywords}))\b",
        keywords = KEYWORDS.join("|")
    ))
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Comment,
    String,
    Keyword,
    Number,
    Plain,
}

impl TokenKind {
    /// Class attribute used in the markup, `None` for plain text.
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            TokenKind::Comment => Some("tok-com"),
            TokenKind::String => Some("tok-str"),
            TokenKind::Keyword => Some("tok-kw"),
            TokenKind::Number => Some("tok-num"),
            TokenKind::Plain => None,
        }
    }
}

/// A classified slice of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of `text` in the input.
    pub start: usize,
}

/// Splits `code` into tokens whose texts concatenate back to `code`.
pub fn tokenize(code: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for m in COMMENT_OR_STRING.find_iter(code) {
        if m.start() > last {
            tokenize_plain(code, last, m.start(), &mut tokens);
        }
        let text = m.as_str();
        let kind = if text.starts_with("//") || text.starts_with("/*") {
            TokenKind::Comment
        } else {
            TokenKind::String
        };
        tokens.push(Token {
            kind,
            text,
            start: m.start(),
        });
        last = m.end();
    }

    if last < code.len() {
        tokenize_plain(code, last, code.len(), &mut tokens);
    }

    tokens
}

fn tokenize_plain<'a>(code: &'a str, from: usize, to: usize, tokens: &mut Vec<Token<'a>>) {
    let segment = &code[from..to];
    let mut last = 0;

    for caps in NUMBER_OR_KEYWORD.captures_iter(segment) {
        let (kind, m) = match (caps.get(1), caps.get(2)) {
            (Some(m), _) => (TokenKind::Number, m),
            (None, Some(m)) => (TokenKind::Keyword, m),
            (None, None) => continue,
        };
        if m.start() > last {
            tokens.push(Token {
                kind: TokenKind::Plain,
                text: &segment[last..m.start()],
                start: from + last,
            });
        }
        tokens.push(Token {
            kind,
            text: m.as_str(),
            start: from + m.start(),
        });
        last = m.end();
    }

    if last < segment.len() {
        tokens.push(Token {
            kind: TokenKind::Plain,
            text: &segment[last..],
            start: from + last,
        });
    }
}

/// Renders `code` as HTML with `<span class="tok-*">` around every tagged token.
pub fn highlight(code: &str) -> String {
    let mut html = String::with_capacity(code.len() + code.len() / 2);

    for token in tokenize(code) {
        match token.kind.css_class() {
            Some(class) => {
                html.push_str("<span class=\"");
                html.push_str(class);
                html.push_str("\">");
                push_escaped(&mut html, token.text);
                html.push_str("</span>");
            }
            None => push_escaped(&mut html, token.text),
        }
    }

    html
}

/// [`highlight`] for an overlay behind a text area: a trailing newline gets a space
/// after it so the last empty line keeps its height.
pub fn highlight_editor(code: &str) -> String {
    let mut html = highlight(code);
    if code.ends_with('\n') {
        html.push(' ');
    }
    html
}

/// Tokens regrouped per line, with tokens spanning a newline split at it.
/// The newline characters themselves are dropped.
pub fn token_lines(code: &str) -> Vec<Vec<Token<'_>>> {
    let mut lines = vec![Vec::new()];

    for token in tokenize(code) {
        let mut offset = token.start;
        for (i, piece) in token.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Vec::new());
                offset += 1;
            }
            if !piece.is_empty() {
                if let Some(line) = lines.last_mut() {
                    line.push(Token {
                        kind: token.kind,
                        text: piece,
                        start: offset,
                    });
                }
            }
            offset += piece.len();
        }
    }

    lines
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
