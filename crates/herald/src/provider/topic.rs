// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic registry and per-consumer selections.

use super::context::ProviderContext;
use super::tasks::{NotificationTask, TopicTask};
use crate::cache::{RegisteredTopic, TopicSelection};
use crate::error::{Error, Result};
use crate::scheduler::TaskHandler;
use crate::types::{ConsumerId, Topic, TopicState};
use crate::wire::{Payload, RequestHandle, ResponseStatus};
use std::collections::HashSet;
use std::sync::Arc;

pub(crate) struct TopicWorker {
    ctx: Arc<ProviderContext>,
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid("empty topic name"));
    }
    Ok(())
}

impl TopicWorker {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }

    fn catalog_changed(&self, consumer_id: Option<ConsumerId>) {
        self.ctx
            .queues
            .notification
            .push(NotificationTask::TopicChanged { consumer_id });
    }

    fn register(&mut self, name: String) -> Result<()> {
        check_name(&name)?;
        self.ctx.topics.lock().write(RegisteredTopic::new(name.as_str()))?;
        log::info!("[Topic] registered '{}'", name);
        self.catalog_changed(None);
        Ok(())
    }

    fn unregister(&mut self, name: String) -> Result<()> {
        check_name(&name)?;
        self.ctx
            .topics
            .lock()
            .delete(name.as_str())
            .ok_or_else(|| Error::not_found("topic", &name))?;

        let purged = self
            .ctx
            .selections
            .lock()
            .retain(|s| s.topic_name != name);
        log::info!(
            "[Topic] unregistered '{}' ({} selections purged)",
            name,
            purged
        );
        self.catalog_changed(None);
        Ok(())
    }

    fn registered_names(&self) -> HashSet<String> {
        self.ctx.topics.lock().iter().map(|t| t.name.clone()).collect()
    }

    /// Replace everything `consumer_id` selected with `topics`.
    fn post_selection(&mut self, consumer_id: ConsumerId, topics: Vec<Topic>) -> Result<()> {
        if consumer_id.is_nil() {
            return Err(Error::invalid("topic post without consumer id"));
        }
        let registered = self.registered_names();

        {
            let mut selections = self.ctx.selections.lock();
            selections.retain(|s| s.consumer_id != consumer_id);

            for topic in topics {
                if topic.state != TopicState::Subscribed {
                    continue;
                }
                if !registered.contains(&topic.name) {
                    log::warn!(
                        "[Topic] {} selected unregistered topic '{}', skipped",
                        consumer_id,
                        topic.name
                    );
                    continue;
                }
                if let Err(e) = selections.write(TopicSelection::subscribed(consumer_id, topic.name)) {
                    log::debug!("[Topic] duplicate entry in post from {}: {}", consumer_id, e);
                }
            }
        }

        self.catalog_changed(Some(consumer_id));
        Ok(())
    }

    fn set_consumer_topic(&mut self, consumer_id: ConsumerId, name: String, selected: bool) -> Result<()> {
        check_name(&name)?;
        if selected {
            if !self.ctx.topics.lock().contains(name.as_str()) {
                return Err(Error::not_found("topic", &name));
            }
            let mut selections = self.ctx.selections.lock();
            if !selections.contains(&(consumer_id, name.clone())) {
                selections.write(TopicSelection::subscribed(consumer_id, name.as_str()))?;
            }
        } else {
            self.ctx
                .selections
                .lock()
                .delete(&(consumer_id, name.clone()))
                .ok_or_else(|| Error::not_found("consumer topic", &name))?;
        }

        log::debug!(
            "[Topic] {} {} '{}'",
            consumer_id,
            if selected { "selected" } else { "deselected" },
            name
        );
        self.catalog_changed(Some(consumer_id));
        Ok(())
    }

    fn registered(&self) -> Vec<Topic> {
        self.ctx.topics.lock().iter().map(RegisteredTopic::to_topic).collect()
    }

    /// Registered catalog with this consumer's selections marked.
    ///
    /// A consumer that never selected anything sees the catalog unchanged.
    fn selections_for(&self, consumer_id: ConsumerId) -> Vec<Topic> {
        let mut topics = self.registered();
        let selected: HashSet<String> = self
            .ctx
            .selections
            .lock()
            .iter()
            .filter(|s| s.consumer_id == consumer_id && s.state == TopicState::Subscribed)
            .map(|s| s.topic_name.clone())
            .collect();

        for topic in &mut topics {
            if selected.contains(&topic.name) {
                topic.state = TopicState::Subscribed;
            }
        }
        topics
    }

    fn answer_request(&mut self, consumer_id: Option<ConsumerId>, request: RequestHandle) -> Result<()> {
        let topics = match consumer_id {
            Some(id) => self.selections_for(id),
            None => self.registered(),
        };
        let payload = Payload::Topics {
            consumer_id,
            topics,
        };
        self.ctx
            .layer
            .send_response(request, Some(&payload), ResponseStatus::Ok)
    }
}

impl TaskHandler<TopicTask> for TopicWorker {
    fn handle(&mut self, task: TopicTask) -> Result<()> {
        match task {
            TopicTask::Register { name, reply } => reply.send(self.register(name)),
            TopicTask::Unregister { name, reply } => reply.send(self.unregister(name)),
            TopicTask::PostSelection {
                consumer_id,
                topics,
            } => return self.post_selection(consumer_id, topics),
            TopicTask::SetConsumerTopic {
                consumer_id,
                name,
                selected,
                reply,
            } => reply.send(self.set_consumer_topic(consumer_id, name, selected)),
            TopicTask::QueryRegistered { reply } => reply.send(self.registered()),
            TopicTask::QuerySelections { consumer_id, reply } => {
                reply.send(self.selections_for(consumer_id));
            }
            TopicTask::Request {
                consumer_id,
                request,
            } => return self.answer_request(consumer_id, request),
        }
        Ok(())
    }
}
