//! message format accepted by zoom chat incoming webhooks
use serde::Serialize;

/// color of the message head, serialized as hex string
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HeadColor {
    #[serde(rename = "#ff0000")]
    Red,
    #[serde(rename = "#ffa500")]
    Orange,
    #[serde(rename = "#00ff00")]
    Green,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ZoomMessage {
    pub is_markdown_support: bool,
    pub content: Content,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Content {
    pub head: Head,
    pub body: Vec<BodyItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Head {
    pub style: Style,
    pub text: String,
    pub sub_head: SubHead,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Style {
    pub color: HeadColor,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubHead {
    pub text: String,
}

/// one line of the message body
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BodyItem {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl BodyItem {
    pub fn message(text: String) -> Self {
        Self {
            kind: "message",
            text,
        }
    }
}

impl ZoomMessage {
    /// message with markdown disabled and the given head
    pub fn new(color: HeadColor, head: String, sub_head: String, body: Vec<BodyItem>) -> Self {
        Self {
            is_markdown_support: false,
            content: Content {
                head: Head {
                    style: Style { color },
                    text: head,
                    sub_head: SubHead { text: sub_head },
                },
                body,
            },
        }
    }

    pub fn color(&self) -> HeadColor {
        self.content.head.style.color
    }

    pub fn body(&self) -> &[BodyItem] {
        &self.content.body
    }
}
