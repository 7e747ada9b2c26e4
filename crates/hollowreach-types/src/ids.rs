//! Type-safe identifier wrappers.
//!
//! Runtime entities (spots, objects, hitboxes, monsters, players) use
//! UUID v7 so identifiers created in the same run sort by creation time.
//! Reference data (skills, loot tables, items, monster templates) is keyed
//! by the human-readable string used in the catalog files.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Generates a newtype wrapper around a catalog key [`String`].
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a key from anything string-like.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Borrow the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }
    };
}

define_id! {
    /// Unique identifier for a spot (one loaded map).
    SpotId
}

define_id! {
    /// Unique identifier for an object placed on a map.
    ObjectId
}

define_id! {
    /// Unique identifier for a hitbox aggregate.
    HitBoxId
}

define_id! {
    /// Unique identifier for a player account's status aggregate.
    PlayerId
}

define_id! {
    /// Unique identifier for a monster aggregate.
    MonsterId
}

define_id! {
    /// Unique identifier for a domain event.
    EventId
}

define_id! {
    /// Unique identifier for an outbound notification.
    NotificationId
}

define_key! {
    /// Catalog key of a skill specification.
    SkillId
}

define_key! {
    /// Catalog key of a loot table.
    LootTableId
}

define_key! {
    /// Catalog key of an item.
    ItemId
}

define_key! {
    /// Catalog key of a monster template.
    MonsterTemplateId
}
