use serde::{Deserialize, Serialize};

/// How a bus picks the recipients of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Every neighbour in range.
    Broadcast,
    /// Only the neighbour named in `Message::to`.
    HandShake,
    /// Like broadcast; receivers forward what they hear on their next send.
    Rebroadcast,
}

/// Whether the bus stamps the sender's name on delivered messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disclosure {
    Anonymous,
    Id,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    pub enable: bool,
    pub messages_per_second: f64,
    pub comm_range: f64,
    #[serde(rename = "type")]
    pub delivery: Delivery,
    pub kind: Disclosure,
    /// Forwarding limit for rebroadcast delivery.
    pub max_hops: u32,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            enable: true,
            messages_per_second: 1.0,
            comm_range: 0.1,
            delivery: Delivery::Broadcast,
            kind: Disclosure::Anonymous,
            max_hops: 1,
        }
    }
}

impl MessagingConfig {
    /// Ticks between two sends of one agent.
    pub fn send_interval(&self, ticks_per_second: u32) -> u64 {
        if self.messages_per_second <= 0.0 {
            return u64::MAX;
        }
        ((f64::from(ticks_per_second) / self.messages_per_second) as u64).max(1)
    }

    /// Whether an agent sends on `tick` (ticks start at 1).
    pub fn should_send(&self, tick: u64, ticks_per_second: u32) -> bool {
        if !self.enable || tick == 0 || self.messages_per_second <= 0.0 {
            return false;
        }
        (tick - 1) % self.send_interval(ticks_per_second) == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub tick: u64,
    /// Sender name, filled in by the bus when disclosure is `Id`.
    pub from: Option<String>,
    /// Addressee for hand-shake delivery.
    pub to: Option<String>,
    pub hops: u32,
    pub body: serde_json::Value,
}

impl Message {
    pub fn new(tick: u64, body: serde_json::Value) -> Self {
        Self {
            tick,
            from: None,
            to: None,
            hops: 0,
            body,
        }
    }

    pub fn addressed_to(mut self, to: &str) -> Self {
        self.to = Some(to.to_string());
        self
    }

    /// Copy of this message one hop further along.
    pub fn relayed(&self) -> Self {
        let mut next = self.clone();
        next.hops += 1;
        next.from = None;
        next
    }
}
