// =============================================================================
// BATCH UPDATE REQUESTS
// =============================================================================
//
// The subset of Google Docs `batchUpdate` requests the compiler emits.
// See: https://developers.google.com/docs/api/reference/rest/v1/documents/request
//
// Every request serializes the way the Docs API expects it: an object with a
// single camelCase key naming the operation, e.g.
// `{"insertText": {"text": "Hi", "location": {"index": 1}}}`.
// `None` fields are omitted rather than sent as `null`.

use serde::{Deserialize, Serialize};

/// Length of `text` in the unit the Docs API counts indices in (UTF-16 code units).
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A hyperlink target attached to a text style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Character style flags shared by the read path and the write path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    #[serde(skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl TextStyle {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::default()
        }
    }

    pub fn strikethrough() -> Self {
        Self {
            strikethrough: true,
            ..Self::default()
        }
    }

    pub fn link(url: impl Into<String>) -> Self {
        Self {
            link: Some(Link {
                url: Some(url.into()),
            }),
            ..Self::default()
        }
    }

    /// Union of two styles; `other`'s link wins when both carry one.
    pub fn merge(&self, other: &TextStyle) -> TextStyle {
        TextStyle {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            strikethrough: self.strikethrough || other.strikethrough,
            link: other.link.clone().or_else(|| self.link.clone()),
        }
    }

    pub fn link_url(&self) -> Option<&str> {
        self.link.as_ref().and_then(|l| l.url.as_deref())
    }

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.strikethrough && self.link_url().is_none()
    }
}

/// A single insertion point in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
}

/// A half-open `[start_index, end_index)` span of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: usize,
    pub end_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
}

/// Where compiled requests land: the first index plus the optional segment/tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPoint {
    pub index: usize,
    pub segment_id: Option<String>,
    pub tab_id: Option<String>,
}

impl InsertionPoint {
    /// Index 0 is reserved by the Docs API, so a fresh body starts at 1.
    pub const DOCUMENT_START: usize = 1;

    pub fn at(index: usize) -> Self {
        Self {
            index,
            segment_id: None,
            tab_id: None,
        }
    }

    pub fn with_tab(mut self, tab_id: Option<String>) -> Self {
        self.tab_id = tab_id;
        self
    }

    pub fn location(&self, index: usize) -> Location {
        Location {
            index,
            segment_id: self.segment_id.clone(),
            tab_id: self.tab_id.clone(),
        }
    }

    pub fn range(&self, start_index: usize, end_index: usize) -> Range {
        Range {
            start_index,
            end_index,
            segment_id: self.segment_id.clone(),
            tab_id: self.tab_id.clone(),
        }
    }
}

impl Default for InsertionPoint {
    fn default() -> Self {
        Self::at(Self::DOCUMENT_START)
    }
}

/// Named paragraph styles the compiler applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NamedStyleType {
    NormalText,
    Title,
    Subtitle,
    #[serde(rename = "HEADING_1")]
    Heading1,
    #[serde(rename = "HEADING_2")]
    Heading2,
    #[serde(rename = "HEADING_3")]
    Heading3,
    #[serde(rename = "HEADING_4")]
    Heading4,
    #[serde(rename = "HEADING_5")]
    Heading5,
    #[serde(rename = "HEADING_6")]
    Heading6,
}

impl NamedStyleType {
    /// Heading style for a Markdown heading level; `None` outside 1..=6.
    pub fn heading(level: usize) -> Option<Self> {
        match level {
            1 => Some(Self::Heading1),
            2 => Some(Self::Heading2),
            3 => Some(Self::Heading3),
            4 => Some(Self::Heading4),
            5 => Some(Self::Heading5),
            6 => Some(Self::Heading6),
            _ => None,
        }
    }

    /// Markdown heading level, with `TITLE` and `SUBTITLE` mapped to 1 and 2.
    pub fn heading_level(&self) -> Option<usize> {
        match self {
            Self::NormalText => None,
            Self::Title | Self::Heading1 => Some(1),
            Self::Subtitle | Self::Heading2 => Some(2),
            Self::Heading3 => Some(3),
            Self::Heading4 => Some(4),
            Self::Heading5 => Some(5),
            Self::Heading6 => Some(6),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    pub named_style_type: NamedStyleType,
}

/// Bullet glyph presets used for Markdown lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletPreset {
    #[serde(rename = "BULLET_DISC_CIRCLE_SQUARE")]
    Bulleted,
    #[serde(rename = "NUMBERED_DECIMAL_ALPHA_ROMAN")]
    Numbered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstringMatchCriteria {
    pub text: String,
    pub match_case: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsCriteria {
    pub tab_ids: Vec<String>,
}

/// One operation of a Docs `batchUpdate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    InsertText { text: String, location: Location },

    #[serde(rename_all = "camelCase")]
    InsertInlineImage { uri: String, location: Location },

    #[serde(rename_all = "camelCase")]
    InsertPageBreak { location: Location },

    #[serde(rename_all = "camelCase")]
    InsertTable {
        rows: usize,
        columns: usize,
        location: Location,
    },

    #[serde(rename_all = "camelCase")]
    UpdateTextStyle {
        text_style: TextStyle,
        range: Range,
        fields: String,
    },

    #[serde(rename_all = "camelCase")]
    UpdateParagraphStyle {
        paragraph_style: ParagraphStyle,
        range: Range,
        fields: String,
    },

    #[serde(rename_all = "camelCase")]
    CreateParagraphBullets {
        range: Range,
        bullet_preset: BulletPreset,
    },

    #[serde(rename_all = "camelCase")]
    ReplaceAllText {
        replace_text: String,
        contains_text: SubstringMatchCriteria,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tabs_criteria: Option<TabsCriteria>,
    },
}

impl Request {
    pub fn insert_text(text: impl Into<String>, location: Location) -> Self {
        Self::InsertText {
            text: text.into(),
            location,
        }
    }

    pub fn text_style(style: TextStyle, range: Range) -> Self {
        Self::UpdateTextStyle {
            text_style: style,
            range,
            fields: "*".to_string(),
        }
    }

    pub fn named_style(named_style_type: NamedStyleType, range: Range) -> Self {
        Self::UpdateParagraphStyle {
            paragraph_style: ParagraphStyle { named_style_type },
            range,
            fields: "namedStyleType".to_string(),
        }
    }

    pub fn replace_all_text(
        find: impl Into<String>,
        replace: impl Into<String>,
        match_case: bool,
        tab_ids: Option<Vec<String>>,
    ) -> Self {
        Self::ReplaceAllText {
            replace_text: replace.into(),
            contains_text: SubstringMatchCriteria {
                text: find.into(),
                match_case,
            },
            tabs_criteria: tab_ids.map(|tab_ids| TabsCriteria { tab_ids }),
        }
    }
}
