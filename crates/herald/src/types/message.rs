// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Notification messages, sync records and control codes.

use super::ids::{MessageId, ProviderId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity class of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MessageType {
    Alert = 1,
    #[default]
    Notice = 2,
    Event = 3,
    Info = 4,
}

/// Read/dismiss state of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SyncType {
    #[default]
    Unread = 0,
    Read = 1,
    Deleted = 2,
}

impl SyncType {
    /// Numeric code used by the wire layer.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SyncType::Unread),
            1 => Some(SyncType::Read),
            2 => Some(SyncType::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncType::Unread => "unread",
            SyncType::Read => "read",
            SyncType::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// Reserved message ids carrying provider policy on the message channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlCode {
    /// Subscription accepted.
    Allow = 1,
    /// Subscription denied.
    Deny = 2,
    /// Topic catalog changed.
    Topic = 3,
}

impl ControlCode {
    #[must_use]
    pub fn message_id(self) -> MessageId {
        MessageId(self as u64)
    }

    #[must_use]
    pub fn from_message_id(id: MessageId) -> Option<Self> {
        match id.0 {
            1 => Some(ControlCode::Allow),
            2 => Some(ControlCode::Deny),
            3 => Some(ControlCode::Topic),
            _ => None,
        }
    }
}

/// Optional media attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaContents {
    pub icon_image: String,
}

/// A notification published by a provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub provider_id: Option<ProviderId>,
    pub kind: MessageType,
    /// Creation time as supplied by the application.
    pub time: Option<String>,
    /// Time to live in seconds, zero for unlimited.
    pub ttl: u64,
    pub title: String,
    pub content_text: String,
    pub source_name: String,
    /// Topic filter; `None` reaches every accepted subscriber.
    pub topic: Option<String>,
    pub media: Option<MediaContents>,
    #[serde(default)]
    pub extra_info: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    /// Create an application message with the given id.
    #[must_use]
    pub fn new(id: MessageId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Build the control message for a policy or catalog change.
    #[must_use]
    pub fn control(provider_id: ProviderId, code: ControlCode) -> Self {
        Self {
            id: code.message_id(),
            provider_id: Some(provider_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_content(mut self, text: impl Into<String>) -> Self {
        self.content_text = text.into();
        self
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: MessageType) -> Self {
        self.kind = kind;
        self
    }

    /// Control code carried by this message, if its id is reserved.
    #[must_use]
    pub fn control_code(&self) -> Option<ControlCode> {
        ControlCode::from_message_id(self.id)
    }

    /// Topic name, treating an empty string as no topic.
    #[must_use]
    pub fn topic_name(&self) -> Option<&str> {
        self.topic.as_deref().filter(|t| !t.is_empty())
    }
}

/// Read/dismiss synchronization record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncInfo {
    pub message_id: MessageId,
    pub provider_id: Option<ProviderId>,
    pub state: SyncType,
}

impl SyncInfo {
    #[must_use]
    pub fn new(message_id: MessageId, provider_id: Option<ProviderId>, state: SyncType) -> Self {
        Self {
            message_id,
            provider_id,
            state,
        }
    }
}
