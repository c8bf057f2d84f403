use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static INFOBOX_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\{\{\s*infobox").unwrap());
static PIPED_TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{[^{}\n]*?\|([^|{}\n]*?)\}\}").unwrap());
static PIPED_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[[^\[\]\n]*?\|([^|\[\]\n]*?)\]\]").unwrap());
static BARE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\[\]\n]*?)\]\]").unwrap());
static EMPHASIS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'''(.*?)'''").unwrap());
static BARE_TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{[^{}]*?\}\}").unwrap());
static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{\|.*?\|\}").unwrap());
static DATE_RESIDUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"date=\w+ \d{4}").unwrap());
static META_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#.*$").unwrap());
static REF_SELF_CLOSING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<ref(?:\s[^>]*)?/>").unwrap());
static REF_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<ref(?:\s[^>]*[^/>])?>.*?</ref>").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Convert one article body from markup to plain text in a single pass.
///
/// Never fails: unbalanced or deeply nested markup comes back with residual
/// artifacts instead. Nested links resolve one level per pass; see
/// [`normalize_with_passes`] for the bounded fixed-point variant.
pub fn normalize(raw: &str) -> String {
    normalize_with_passes(raw, 1)
}

/// Re-run the rewrite pipeline until the text stops changing or `max_passes`
/// passes have run. At least one pass always runs.
pub fn normalize_with_passes(raw: &str, max_passes: usize) -> String {
    let mut text = rewrite(raw);
    for _ in 1..max_passes {
        let next = rewrite(&text);
        if next == text {
            break;
        }
        text = next;
    }
    text
}

/// One pass of the ordered rules. Later rules rely on earlier ones having
/// already collapsed piped templates and links.
fn rewrite(raw: &str) -> String {
    let text = strip_infoboxes(raw);
    let text = PIPED_TEMPLATE_RE.replace_all(&text, "${1}");
    let text = PIPED_LINK_RE.replace_all(&text, "${1}");
    let text = BARE_LINK_RE.replace_all(&text, "${1}");
    let text = EMPHASIS_RE.replace_all(&text, "${1}");
    let text = strip_templates(&text);
    let text = TABLE_RE.replace_all(&text, "");
    let text = DATE_RESIDUE_RE.replace_all(&text, "");
    let text = META_LINE_RE.replace_all(&text, "");
    let text = REF_SELF_CLOSING_RE.replace_all(&text, "");
    let text = REF_BLOCK_RE.replace_all(&text, "");
    let text = COMMENT_RE.replace_all(&text, "");
    text.into_owned()
}

/// Drop whole `{{Infobox ...}}` templates, nested braces and newlines
/// included. An infobox without a balanced close is left for the later rules.
fn strip_infoboxes(text: &str) -> Cow<'_, str> {
    if !INFOBOX_OPEN_RE.is_match(text) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(m) = INFOBOX_OPEN_RE.find(rest) {
        let Some(len) = balanced_template_len(&rest[m.start()..]) else {
            break;
        };
        out.push_str(&rest[..m.start()]);
        rest = &rest[m.start() + len..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Drop every remaining `{{...}}`, innermost first, so templates nested
/// inside templates leave no braces behind.
fn strip_templates(text: &str) -> String {
    let mut text = BARE_TEMPLATE_RE.replace_all(text, "").into_owned();
    while BARE_TEMPLATE_RE.is_match(&text) {
        text = BARE_TEMPLATE_RE.replace_all(&text, "").into_owned();
    }
    text
}

/// Byte length of the balanced `{{ ... }}` run that opens `s`, if it closes.
fn balanced_template_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'{', b'{') => {
                depth += 1;
                i += 2;
            }
            (b'}', b'}') if depth > 0 => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}

// ── Tests ──
