// Chat input events and reply markup

//! # Chat Input Events
//!
//! The transport layer turns whatever the chat platform delivers into a
//! [`UserInput`]. The engine only ever sees these three shapes: plain text,
//! a photo attachment (with optional caption), or an inline button press
//! carrying callback data.
//!
//! [`ControlCommand`] recognises the two commands that are valid in any
//! active step (`cancel` and `back`), and [`Keyboard`] describes the reply
//! markup sent alongside prompts.

use serde::{Deserialize, Serialize};

use super::record::PhotoRef;

/// Identifier of one chat conversation
///
/// One session, and so at most one running wizard, exists per conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One inbound event from the chat transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserInput {
    /// A plain text message
    Text { text: String },

    /// A photo attachment; the transport picks the largest size and passes its id
    Photo {
        photo: PhotoRef,
        caption: Option<String>,
    },

    /// An inline keyboard button press
    Callback { data: String },
}

impl UserInput {
    pub fn text<S: Into<String>>(text: S) -> Self {
        UserInput::Text { text: text.into() }
    }

    pub fn photo<S: Into<String>>(file_id: S) -> Self {
        UserInput::Photo {
            photo: PhotoRef::new(file_id),
            caption: None,
        }
    }

    pub fn photo_with_caption<S: Into<String>, C: Into<String>>(file_id: S, caption: C) -> Self {
        UserInput::Photo {
            photo: PhotoRef::new(file_id),
            caption: Some(caption.into()),
        }
    }

    pub fn callback<S: Into<String>>(data: S) -> Self {
        UserInput::Callback { data: data.into() }
    }

    /// The text body, if this is a text message
    pub fn as_text(&self) -> Option<&str> {
        match self {
            UserInput::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }

    /// Short label used in log lines; never includes user content
    pub fn kind(&self) -> &'static str {
        match self {
            UserInput::Text { .. } => "text",
            UserInput::Photo { .. } => "photo",
            UserInput::Callback { .. } => "callback",
        }
    }
}

/// Commands accepted from any active wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Cancel,
    Back,
}

impl ControlCommand {
    /// Recognise `/cancel`, `/back`, or the bare words in any letter case
    ///
    /// Only text messages can carry a control command.
    pub fn parse(input: &UserInput) -> Option<Self> {
        let text = input.as_text()?.trim();
        let word = text.strip_prefix('/').unwrap_or(text);
        if word.eq_ignore_ascii_case("cancel") {
            Some(ControlCommand::Cancel)
        } else if word.eq_ignore_ascii_case("back") {
            Some(ControlCommand::Back)
        } else {
            None
        }
    }
}

/// Reply markup attached to an outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Keyboard {
    /// Persistent reply keyboard; `row_width` buttons per row
    Reply {
        buttons: Vec<String>,
        placeholder: Option<String>,
        row_width: usize,
    },

    /// Buttons under the message, each as `(label, callback data)`
    Inline {
        buttons: Vec<(String, String)>,
        row_width: usize,
    },

    /// Hide any reply keyboard currently shown
    Remove,
}

impl Keyboard {
    /// Inline buttons laid out one per row
    pub fn inline<L: Into<String>, D: Into<String>>(buttons: Vec<(L, D)>) -> Self {
        Keyboard::Inline {
            buttons: buttons
                .into_iter()
                .map(|(label, data)| (label.into(), data.into()))
                .collect(),
            row_width: 1,
        }
    }

    /// Callback data of every inline button, in order
    pub fn callback_data(&self) -> Vec<&str> {
        match self {
            Keyboard::Inline { buttons, .. } => buttons.iter().map(|(_, d)| d.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}
