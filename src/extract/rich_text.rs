//! 富文本转纯文本
//!
//! 只保留可读文字，丢弃样式与标记：
//! - HTML：去掉 script/style/注释，块级结束标签与 `<br>` 转为换行，解码实体。
//! - RTF：跳过字体表、颜色表等非正文目标组，`\par` 转换行，解码 `\'hh` 与 `\uN`。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CF_HTML_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\AVersion:\d+\.\d+\r?\n.*?(<)").expect("valid regex"));
static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("valid regex")
});
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static SOURCE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|li|tr|h[1-6]|blockquote|pre|table|ul|ol)\s*>")
        .expect("valid regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid regex"));
static EXTRA_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(numeric) = entity.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "copy" => "©",
        "reg" => "®",
        "hellip" => "…",
        "mdash" => "—",
        "ndash" => "–",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        "bull" => "•",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// HTML 转纯文本（未做首尾裁剪之外的归一化）。
pub fn strip_html(html: &str) -> String {
    let body = CF_HTML_HEADER.replace(html, "$1");
    let body = SCRIPT_OR_STYLE.replace_all(&body, "");
    let body = COMMENT.replace_all(&body, "");
    let body = SOURCE_WHITESPACE.replace_all(&body, " ");
    let body = LINE_BREAK.replace_all(&body, "\n");
    let body = TAG.replace_all(&body, "");
    let body = ENTITY.replace_all(&body, |caps: &Captures<'_>| {
        decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });

    let joined = body
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    EXTRA_BLANK_LINES.replace_all(&joined, "\n\n").into_owned()
}

/// 正文之外、整体跳过的 RTF 目标组。
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "xmlnstbl",
    "themedata",
    "colorschememapping",
    "latentstyles",
    "datastore",
    "fldinst",
    "object",
    "expandedcolortbl",
];

#[derive(Debug, Clone, Copy)]
struct RtfGroup {
    skip: bool,
    unicode_fallback_len: usize,
}

struct RtfStripper {
    chars: Vec<char>,
    pos: usize,
    out: String,
    groups: Vec<RtfGroup>,
    pending_fallback: usize,
}

impl RtfStripper {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            out: String::with_capacity(input.len() / 2),
            groups: vec![RtfGroup {
                skip: false,
                unicode_fallback_len: 1,
            }],
            pending_fallback: 0,
        }
    }

    fn current(&mut self) -> &mut RtfGroup {
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    fn emit(&mut self, c: char) {
        if self.pending_fallback > 0 {
            self.pending_fallback -= 1;
            return;
        }
        if !self.current().skip {
            self.out.push(c);
        }
    }

    fn emit_str(&mut self, s: &str) {
        if self.current().skip {
            return;
        }
        self.pending_fallback = 0;
        self.out.push_str(s);
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(mut self) -> String {
        while let Some(c) = self.peek(0) {
            match c {
                '{' => {
                    let parent = *self.current();
                    self.groups.push(parent);
                    self.pos += 1;
                }
                '}' => {
                    if self.groups.len() > 1 {
                        self.groups.pop();
                    }
                    self.pending_fallback = 0;
                    self.pos += 1;
                }
                '\\' => self.control(),
                '\r' | '\n' => self.pos += 1,
                other => {
                    self.emit(other);
                    self.pos += 1;
                }
            }
        }
        self.out
    }

    fn control(&mut self) {
        let Some(next) = self.peek(1) else {
            self.pos += 1;
            return;
        };

        match next {
            '\\' | '{' | '}' => {
                self.emit(next);
                self.pos += 2;
            }
            '*' => {
                self.current().skip = true;
                self.pos += 2;
            }
            '\'' => {
                let hex: String = self
                    .chars
                    .iter()
                    .skip(self.pos + 2)
                    .take(2)
                    .take_while(|c| c.is_ascii_hexdigit())
                    .collect();
                // 只吞掉十六进制数字，按字符计数
                self.pos += 2 + hex.chars().count();
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    // Windows-1252 近似为 Latin-1
                    self.emit(char::from(byte));
                }
            }
            '~' => {
                self.emit(' ');
                self.pos += 2;
            }
            '_' => {
                self.emit('-');
                self.pos += 2;
            }
            '\r' | '\n' => {
                self.emit_str("\n");
                self.pos += 2;
            }
            c if c.is_ascii_alphabetic() => self.control_word(),
            _ => self.pos += 2,
        }
    }

    fn control_word(&mut self) {
        self.pos += 1;
        let start = self.pos;
        while self.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();

        let param_start = self.pos;
        if self.peek(0) == Some('-') {
            self.pos += 1;
        }
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let param: Option<i32> = self.chars[param_start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .ok();

        if self.peek(0) == Some(' ') {
            self.pos += 1;
        }

        match word.as_str() {
            "par" | "line" | "row" | "sect" | "page" => self.emit_str("\n"),
            "tab" | "cell" => self.emit_str("\t"),
            "emdash" => self.emit_str("—"),
            "endash" => self.emit_str("–"),
            "bullet" => self.emit_str("•"),
            "lquote" => self.emit_str("‘"),
            "rquote" => self.emit_str("’"),
            "ldblquote" => self.emit_str("“"),
            "rdblquote" => self.emit_str("”"),
            "uc" => {
                self.current().unicode_fallback_len = param.unwrap_or(1).max(0) as usize;
            }
            "u" => {
                if let Some(value) = param {
                    let code = if value < 0 { value + 65_536 } else { value };
                    if let Some(c) = u32::try_from(code).ok().and_then(char::from_u32) {
                        self.emit_str(&c.to_string());
                    }
                    self.pending_fallback = self.current().unicode_fallback_len;
                }
            }
            w if SKIPPED_DESTINATIONS.contains(&w) => self.current().skip = true,
            _ => {}
        }
    }
}

/// RTF 转纯文本。
pub fn strip_rtf(rtf: &str) -> String {
    RtfStripper::new(rtf).run()
}

#[cfg(test)]
mod tests {
    use super::{strip_html, strip_rtf};

    #[test]
    fn html_bold_becomes_plain() {
        assert_eq!(strip_html("<b>Hi</b>"), "Hi");
    }

    #[test]
    fn html_blocks_and_breaks_become_newlines() {
        let html = "<div>first line</div>\n  <p>second<br/>third</p>";
        assert_eq!(strip_html(html).trim(), "first line\nsecond\nthird");
    }

    #[test]
    fn html_script_style_and_comments_are_dropped() {
        let html = "<style>p { color: red; }</style><!--StartFragment--><p>text</p><script>alert(1)</script>";
        assert_eq!(strip_html(html).trim(), "text");
    }

    #[test]
    fn html_entities_are_decoded() {
        assert_eq!(
            strip_html("a &amp; b &lt;c&gt; &#65;&#x42; &unknown;"),
            "a & b <c> AB &unknown;"
        );
    }

    #[test]
    fn cf_html_header_is_removed() {
        let html = "Version:0.9\r\nStartHTML:0000000105\r\nEndHTML:0000000199\r\n<html><body><!--StartFragment-->Copied<!--EndFragment--></body></html>";
        assert_eq!(strip_html(html).trim(), "Copied");
    }

    #[test]
    fn rtf_skips_tables_and_keeps_text() {
        let rtf = r"{\rtf1\ansi{\fonttbl\f0\fswiss Helvetica;}{\colortbl;\red255\green0\blue0;}\f0\pard This is {\b bold} text.\par Second line\'e9}";
        assert_eq!(strip_rtf(rtf), "This is bold text.\nSecond line\u{e9}");
    }

    #[test]
    fn rtf_ignorable_destinations_are_skipped() {
        let rtf = r"{\rtf1{\*\generator Riched20;}{\*\expandedcolortbl;;}Hello}";
        assert_eq!(strip_rtf(rtf), "Hello");
    }

    #[test]
    fn rtf_unicode_escape_skips_fallback() {
        let rtf = r"{\rtf1\uc1 caf\u233?, \u-3913?ok}";
        assert_eq!(strip_rtf(rtf), "caf\u{e9}, \u{f0b7}ok");
    }

    #[test]
    fn rtf_escaped_braces_are_literal() {
        assert_eq!(strip_rtf(r"{\rtf1 a\{b\}c\\d}"), r"a{b}c\d");
    }

    #[test]
    fn rtf_malformed_hex_escape_keeps_following_text() {
        assert_eq!(strip_rtf("{\\rtf1 a\\'\u{e9}b}"), "a\u{e9}b");
        assert_eq!(strip_rtf("{\\rtf1 caf\\'e9!}"), "caf\u{e9}!");
    }
}
