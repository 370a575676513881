// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use crossbeam::channel::{unbounded, Receiver, Sender};
use herald::{
    ChannelId, Connection, ConsumerId, ConsumerLink, ConsumerListener, DiscoveredProvider,
    Message, Payload, Presence, ProviderId, ProviderListener, ProviderState, RequestHandle,
    ResourceKind, ResourceLayer, ResponseStatus, SyncInfo, Topic,
};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

pub const WAIT: Duration = Duration::from_secs(2);

/// Poll `cond` until it holds or two seconds pass.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

pub type Notification = (ResourceKind, Vec<ChannelId>, Payload);

/// Provider resource layer that records every outbound call.
#[derive(Default)]
pub struct RecordingLayer {
    notifications: Mutex<Vec<Notification>>,
    responses: Mutex<Vec<(RequestHandle, Option<Payload>, ResponseStatus)>>,
    presences: Mutex<Vec<Presence>>,
}

impl RecordingLayer {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn responses(&self) -> Vec<(RequestHandle, Option<Payload>, ResponseStatus)> {
        self.responses.lock().clone()
    }

    pub fn presences(&self) -> Vec<Presence> {
        self.presences.lock().clone()
    }
}

impl ResourceLayer for RecordingLayer {
    fn notify_recipients(
        &self,
        resource: ResourceKind,
        channels: &[ChannelId],
        payload: &Payload,
    ) -> herald::Result<()> {
        self.notifications
            .lock()
            .push((resource, channels.to_vec(), payload.clone()));
        Ok(())
    }

    fn send_response(
        &self,
        request: RequestHandle,
        payload: Option<&Payload>,
        status: ResponseStatus,
    ) -> herald::Result<()> {
        self.responses.lock().push((request, payload.cloned(), status));
        Ok(())
    }

    fn publish_presence(&self, presence: &Presence) -> herald::Result<()> {
        self.presences.lock().push(presence.clone());
        Ok(())
    }
}

/// Outbound consumer call, addressed by provider and connection address.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkCall {
    Subscribe(ProviderId, String),
    Unsubscribe(ProviderId, String),
    SendSync(ProviderId, SyncInfo),
    PostTopics(ProviderId, Vec<Topic>),
    FetchTopics(ProviderId),
    Rescan,
}

#[derive(Default)]
pub struct RecordingLink {
    calls: Mutex<Vec<LinkCall>>,
}

impl RecordingLink {
    pub fn calls(&self) -> Vec<LinkCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: LinkCall) -> herald::Result<()> {
        self.calls.lock().push(call);
        Ok(())
    }
}

impl ConsumerLink for RecordingLink {
    fn request_subscribe(&self, provider_id: ProviderId, connection: &Connection) -> herald::Result<()> {
        self.record(LinkCall::Subscribe(provider_id, connection.address.clone()))
    }

    fn request_unsubscribe(&self, provider_id: ProviderId, connection: &Connection) -> herald::Result<()> {
        self.record(LinkCall::Unsubscribe(provider_id, connection.address.clone()))
    }

    fn send_sync(&self, provider_id: ProviderId, _connection: &Connection, sync: &SyncInfo) -> herald::Result<()> {
        self.record(LinkCall::SendSync(provider_id, *sync))
    }

    fn post_topics(&self, provider_id: ProviderId, _connection: &Connection, topics: &[Topic]) -> herald::Result<()> {
        self.record(LinkCall::PostTopics(provider_id, topics.to_vec()))
    }

    fn fetch_topics(&self, provider_id: ProviderId, _connection: &Connection) -> herald::Result<()> {
        self.record(LinkCall::FetchTopics(provider_id))
    }

    fn rescan(&self) -> herald::Result<()> {
        self.record(LinkCall::Rescan)
    }
}

/// Provider callbacks forwarded into channels.
pub struct ChannelProviderListener {
    subscribe_tx: Sender<ConsumerId>,
    sync_tx: Sender<SyncInfo>,
}

pub struct ProviderEvents {
    pub subscribe_requests: Receiver<ConsumerId>,
    pub syncs: Receiver<SyncInfo>,
}

pub fn provider_listener() -> (ChannelProviderListener, ProviderEvents) {
    let (subscribe_tx, subscribe_requests) = unbounded();
    let (sync_tx, syncs) = unbounded();
    (
        ChannelProviderListener {
            subscribe_tx,
            sync_tx,
        },
        ProviderEvents {
            subscribe_requests,
            syncs,
        },
    )
}

impl ProviderListener for ChannelProviderListener {
    fn on_subscribe_request(&self, consumer_id: ConsumerId) {
        let _ = self.subscribe_tx.send(consumer_id);
    }

    fn on_sync_info(&self, sync: &SyncInfo) {
        let _ = self.sync_tx.send(*sync);
    }
}

/// Consumer callbacks forwarded into channels.
pub struct ChannelConsumerListener {
    discovered_tx: Sender<DiscoveredProvider>,
    state_tx: Sender<(ProviderId, ProviderState)>,
    message_tx: Sender<Message>,
    sync_tx: Sender<SyncInfo>,
}

pub struct ConsumerEvents {
    pub discovered: Receiver<DiscoveredProvider>,
    pub states: Receiver<(ProviderId, ProviderState)>,
    pub messages: Receiver<Message>,
    pub syncs: Receiver<SyncInfo>,
}

pub fn consumer_listener() -> (ChannelConsumerListener, ConsumerEvents) {
    let (discovered_tx, discovered) = unbounded();
    let (state_tx, states) = unbounded();
    let (message_tx, messages) = unbounded();
    let (sync_tx, syncs) = unbounded();
    (
        ChannelConsumerListener {
            discovered_tx,
            state_tx,
            message_tx,
            sync_tx,
        },
        ConsumerEvents {
            discovered,
            states,
            messages,
            syncs,
        },
    )
}

impl ConsumerListener for ChannelConsumerListener {
    fn on_provider_discovered(&self, provider: &DiscoveredProvider) {
        let _ = self.discovered_tx.send(provider.clone());
    }

    fn on_provider_state_changed(&self, provider_id: ProviderId, state: ProviderState) {
        let _ = self.state_tx.send((provider_id, state));
    }

    fn on_message_received(&self, message: &Message) {
        let _ = self.message_tx.send(message.clone());
    }

    fn on_sync_info_received(&self, sync: &SyncInfo) {
        let _ = self.sync_tx.send(*sync);
    }
}
