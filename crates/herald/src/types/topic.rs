// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topics and provider-side policy enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a consumer has opted into a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TopicState {
    #[default]
    Unsubscribed,
    Subscribed,
}

/// Named filter offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub state: TopicState,
}

impl Topic {
    #[must_use]
    pub fn new(name: impl Into<String>, state: TopicState) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }

    #[must_use]
    pub fn subscribed(name: impl Into<String>) -> Self {
        Self::new(name, TopicState::Subscribed)
    }

    #[must_use]
    pub fn unsubscribed(name: impl Into<String>) -> Self {
        Self::new(name, TopicState::Unsubscribed)
    }
}

/// Who decides whether a subscription request is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPolicy {
    /// The hosting application approves each consumer.
    #[default]
    ProviderDecides,
    /// A consumer's request is accepted as soon as it arrives.
    ConsumerDecides,
}

/// Subscription policy as advertised to consumers during discovery.
pub type AccessPolicy = SubscriptionPolicy;

/// Provider state reported to consumer applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderState {
    Allow = 1,
    Deny = 2,
    Topic = 3,
    Discovered = 11,
    Stopped = 12,
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderState::Allow => "allow",
            ProviderState::Deny => "deny",
            ProviderState::Topic => "topic",
            ProviderState::Discovered => "discovered",
            ProviderState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// How topic-tagged messages treat consumers that never posted a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicFilterMode {
    /// No selection at all means no filtering.
    #[default]
    ReceiveAllUntilSelected,
    /// Topic-tagged messages require a matching selection.
    StrictSelection,
}

/// Link technology of a discovered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransportType {
    #[default]
    Ip,
    Tcp,
    Ble,
    Cloud,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_constructors() {
        assert_eq!(Topic::subscribed("a").state, TopicState::Subscribed);
        assert_eq!(Topic::unsubscribed("a").state, TopicState::Unsubscribed);
    }

    #[test]
    fn test_policy_serde_names() {
        let text = serde_json::to_string(&SubscriptionPolicy::ConsumerDecides).expect("json");
        assert_eq!(text, "\"consumer_decides\"");
        let mode: TopicFilterMode =
            serde_json::from_str("\"strict_selection\"").expect("json");
        assert_eq!(mode, TopicFilterMode::StrictSelection);
    }
}
