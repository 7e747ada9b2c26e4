//! Player notifications and the sinks that deliver them.
//!
//! Handlers stage [`Notification`]s in the unit of work's outbox. The
//! outbox is only delivered after the unit of work commits, so a rolled
//! back tick never tells a player about a kill that did not happen.
//! Delivery is best effort: a failing [`NotificationSink`] is logged and
//! the simulation carries on.

use hollowreach_types::{ItemId, MonsterTemplateId, NotificationId, PlayerId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// Errors a sink can report.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The sink refused the notification.
    #[error("notification {id} rejected: {reason}")]
    Rejected {
        /// The refused notification.
        id: NotificationId,
        /// Why it was refused.
        reason: String,
    },
}

/// What a notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    /// The player landed a killing blow.
    MonsterKilled {
        /// Template of the slain monster.
        template: MonsterTemplateId,
    },
    /// The player reached a new level.
    LevelUp {
        /// The new level.
        level: u32,
    },
    /// Items landed in the player's inventory.
    LootReceived {
        /// Items received.
        items: Vec<ItemId>,
    },
    /// The player was downed.
    Downed,
}

/// A message for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique id.
    pub id: NotificationId,
    /// Recipient.
    pub player: PlayerId,
    /// Tick it was raised on.
    pub tick: u64,
    /// Content.
    pub kind: NotificationKind,
}

impl Notification {
    /// A fresh notification.
    pub fn new(player: PlayerId, tick: u64, kind: NotificationKind) -> Self {
        Self {
            id: NotificationId::new(),
            player,
            tick,
            kind,
        }
    }
}

/// Somewhere notifications go once their unit of work commits.
pub trait NotificationSink {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] if the sink cannot take it. The caller
    /// logs and moves on.
    fn deliver(&mut self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&mut self, notification: &Notification) -> Result<(), NotificationError> {
        info!(
            player = %notification.player,
            tick = notification.tick,
            kind = ?notification.kind,
            "notification"
        );
        Ok(())
    }
}

/// Keeps every delivered notification in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Delivered notifications, in order.
    pub delivered: Vec<Notification>,
}

impl NotificationSink for MemorySink {
    fn deliver(&mut self, notification: &Notification) -> Result<(), NotificationError> {
        self.delivered.push(notification.clone());
        Ok(())
    }
}

/// Forwards notifications to a channel, for delivery by another task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<Notification>,
}

impl ChannelSink {
    /// A sink feeding `sender`.
    pub const fn new(sender: UnboundedSender<Notification>) -> Self {
        Self { sender }
    }
}

impl NotificationSink for ChannelSink {
    fn deliver(&mut self, notification: &Notification) -> Result<(), NotificationError> {
        self.sender
            .send(notification.clone())
            .map_err(|e| NotificationError::Rejected {
                id: notification.id,
                reason: e.to_string(),
            })
    }
}

/// Deliver every notification, logging failures. Returns how many were
/// delivered.
pub fn deliver_all(sink: &mut dyn NotificationSink, notifications: &[Notification]) -> usize {
    let mut delivered: usize = 0;
    for notification in notifications {
        match sink.deliver(notification) {
            Ok(()) => delivered = delivered.saturating_add(1),
            Err(e) => warn!(error = %e, player = %notification.player, "notification dropped"),
        }
    }
    delivered
}
