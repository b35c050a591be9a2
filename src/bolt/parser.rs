use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const ACTION_OPEN: &str = "<boltAction";
pub const ACTION_CLOSE: &str = "</boltAction>";

static ATTRIBUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z_][\w-]*)\s*=\s*"([^"]*)""#).expect("valid attribute regex"));

/// One piece of a chat message: plain text or a completed file action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MessageSegment {
    Text { text: String },
    FileAction { path: String, content: String },
}

/// Attributes of a `<boltAction ...>` opening tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionTag {
    attributes: BTreeMap<String, String>,
}

impl ActionTag {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The target path when this is a `type="file"` action with a path.
    pub fn file_path(&self) -> Option<&str> {
        if self.get("type") != Some("file") {
            return None;
        }
        self.get("filePath").filter(|p| !p.is_empty())
    }
}

/// Parse an opening tag at the start of `input`.
///
/// Returns the attributes and the byte length of the tag including `>`,
/// or `None` while the closing `>` is missing.
pub fn parse_open_tag(input: &str) -> Option<(ActionTag, usize)> {
    debug_assert!(input.starts_with(ACTION_OPEN));
    let end = input.find('>')?;
    let inner = &input[ACTION_OPEN.len()..end];
    let attributes = ATTRIBUTE_RE
        .captures_iter(inner)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect();
    Some((ActionTag { attributes }, end + 1))
}

/// Where the body of an action ends.
pub(crate) enum BodyEnd {
    /// Byte offset of the close tag within the body.
    Closed(usize),
    /// Another opening tag starts at this offset before any close.
    Nested(usize),
    /// Neither has arrived yet.
    Open,
}

pub(crate) fn scan_body(body: &str) -> BodyEnd {
    match (body.find(ACTION_CLOSE), body.find(ACTION_OPEN)) {
        (Some(close), Some(nested)) if nested < close => BodyEnd::Nested(nested),
        (Some(close), _) => BodyEnd::Closed(close),
        (None, Some(nested)) => BodyEnd::Nested(nested),
        (None, None) => BodyEnd::Open,
    }
}

/// Split a message into text and file-action segments.
///
/// Malformed actions stay in the surrounding text: a missing `filePath`,
/// a non-file type, a missing close tag, or a nested opening tag.
pub fn parse_segments(text: &str) -> Vec<MessageSegment> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(rel) = text[cursor..].find(ACTION_OPEN) {
        let open_at = cursor + rel;
        let Some((tag, tag_len)) = parse_open_tag(&text[open_at..]) else {
            break;
        };
        let body_start = open_at + tag_len;
        let body = &text[body_start..];

        match scan_body(body) {
            BodyEnd::Closed(close) => {
                let end = body_start + close + ACTION_CLOSE.len();
                if let Some(path) = tag.file_path() {
                    push_text(&mut segments, &text[text_start..open_at]);
                    segments.push(MessageSegment::FileAction {
                        path: path.to_string(),
                        content: body[..close].trim().to_string(),
                    });
                    text_start = end;
                }
                cursor = end;
            }
            BodyEnd::Nested(nested) => cursor = body_start + nested,
            BodyEnd::Open => break,
        }
    }

    push_text(&mut segments, &text[text_start..]);
    segments
}

fn push_text(segments: &mut Vec<MessageSegment>, text: &str) {
    if !text.is_empty() {
        segments.push(MessageSegment::Text {
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str) -> MessageSegment {
        MessageSegment::FileAction {
            path: path.into(),
            content: content.into(),
        }
    }

    #[test]
    fn splits_text_and_actions() {
        let segments = parse_segments(
            "before<boltAction type=\"file\" filePath=\"a.txt\">\nhello\n</boltAction>after",
        );
        assert_eq!(
            segments,
            vec![
                MessageSegment::Text { text: "before".into() },
                file("a.txt", "hello"),
                MessageSegment::Text { text: "after".into() },
            ]
        );
    }

    #[test]
    fn attribute_order_is_free() {
        let segments = parse_segments("<boltAction filePath=\"x.rs\" type=\"file\">fn main() {}</boltAction>");
        assert_eq!(segments, vec![file("x.rs", "fn main() {}")]);
    }

    #[test]
    fn missing_path_and_shell_actions_stay_text() {
        let input = "<boltAction type=\"file\">x</boltAction><boltAction type=\"shell\">npm i</boltAction>";
        assert_eq!(
            parse_segments(input),
            vec![MessageSegment::Text { text: input.into() }]
        );
    }

    #[test]
    fn unterminated_action_is_text() {
        let input = "ok <boltAction type=\"file\" filePath=\"a\">never closed";
        assert_eq!(
            parse_segments(input),
            vec![MessageSegment::Text { text: input.into() }]
        );
    }

    #[test]
    fn nested_opening_rejects_outer_but_keeps_inner() {
        let input = concat!(
            "<boltAction type=\"file\" filePath=\"outer\">start",
            "<boltAction type=\"file\" filePath=\"inner\">body</boltAction>",
        );
        let segments = parse_segments(input);
        assert_eq!(segments.len(), 2);
        assert!(matches!(&segments[0], MessageSegment::Text { text } if text.ends_with("start")));
        assert_eq!(segments[1], file("inner", "body"));
    }

    #[test]
    fn empty_and_plain_text() {
        assert!(parse_segments("").is_empty());
        assert_eq!(
            parse_segments("no blocks"),
            vec![MessageSegment::Text { text: "no blocks".into() }]
        );
    }

    #[test]
    fn body_end_prefers_whichever_tag_comes_first() {
        assert!(matches!(scan_body("abc</boltAction>"), BodyEnd::Closed(3)));
        assert!(matches!(
            scan_body("a</boltAction><boltAction type=\"file\" filePath=\"b\">"),
            BodyEnd::Closed(1)
        ));
        assert!(matches!(scan_body("a<boltAction type=\"file\">b</boltAction>"), BodyEnd::Nested(1)));
        assert!(matches!(scan_body("ab<boltAction"), BodyEnd::Nested(2)));
        assert!(matches!(scan_body("still writing"), BodyEnd::Open));
    }
}
