use crate::common::{DomainError, DomainResult};
use crate::domains::spatial::{GridEntry, SpatialGrid};
use std::collections::HashMap;

use super::message::{Delivery, Disclosure, Message, MessagingConfig};

/// Range-limited message delivery for one agent type.
#[derive(Debug, Clone)]
pub struct MessageBus {
    config: MessagingConfig,
    grid: SpatialGrid,
    mailboxes: HashMap<String, Vec<Message>>,
}

impl MessageBus {
    pub fn new<I, S>(config: MessagingConfig, members: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let grid = SpatialGrid::new(config.comm_range).map_err(|_| {
            DomainError::configuration("message bus", "comm_range must be positive")
        })?;
        Ok(Self {
            config,
            grid,
            mailboxes: members.into_iter().map(|m| (m.into(), Vec::new())).collect(),
        })
    }

    pub fn config(&self) -> &MessagingConfig {
        &self.config
    }

    pub fn is_member(&self, name: &str) -> bool {
        self.mailboxes.contains_key(name)
    }

    /// Rebuilds the grid from the current positions of every agent, members
    /// or not.
    pub fn update_grid<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = GridEntry>,
    {
        self.grid.rebuild(entries);
    }

    pub fn reset_mailboxes(&mut self) {
        for mailbox in self.mailboxes.values_mut() {
            mailbox.clear();
        }
    }

    /// Neighbours of `sender_id` within communication range.
    pub fn neighbors(&self, sender_id: usize) -> Vec<&GridEntry> {
        self.grid.neighbors(sender_id, self.config.comm_range)
    }

    /// Delivers `message` to the sender's neighbours according to the
    /// configured delivery mode. Returns the number of mailboxes reached.
    pub fn send(&mut self, sender_id: usize, sender_name: &str, message: Message) -> usize {
        if !self.config.enable {
            return 0;
        }
        let mut stamped = message;
        stamped.from = match self.config.kind {
            Disclosure::Id => Some(sender_name.to_string()),
            Disclosure::Anonymous => None,
        };

        let targets: Vec<String> = self
            .grid
            .neighbors(sender_id, self.config.comm_range)
            .into_iter()
            .filter(|n| match self.config.delivery {
                Delivery::Broadcast | Delivery::Rebroadcast => true,
                Delivery::HandShake => stamped.to.as_deref() == Some(n.name.as_str()),
            })
            .map(|n| n.name.clone())
            .collect();

        let mut delivered = 0;
        for name in targets {
            if let Some(mailbox) = self.mailboxes.get_mut(&name) {
                mailbox.push(stamped.clone());
                delivered += 1;
            }
        }
        delivered
    }

    /// Drains and returns the mailbox of `name`.
    pub fn receive(&mut self, name: &str) -> Vec<Message> {
        self.mailboxes
            .get_mut(name)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn pending(&self, name: &str) -> usize {
        self.mailboxes.get(name).map(Vec::len).unwrap_or(0)
    }

    pub fn close(&mut self) {
        self.grid.clear();
        self.mailboxes.clear();
    }
}
