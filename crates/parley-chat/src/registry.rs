//! The chat node's roster of live chatrooms.

use crate::room::Chatroom;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Chatroom>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Creates an empty chatroom. Returns false when the name is taken.
    pub fn create(&self, name: &str) -> bool {
        match self.rooms.entry(name.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(Chatroom::new(name)));
                info!(name, "chatroom created");
                true
            }
        }
    }

    /// Removes the chatroom, closing every subscriber stream with the
    /// room-closed sentinel. Returns false when the room was not here.
    pub fn delete(&self, name: &str) -> bool {
        match self.rooms.remove(name) {
            Some((_, room)) => {
                room.close();
                info!(name, "chatroom deleted");
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Chatroom>> {
        self.rooms.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn names(&self) -> Vec<String> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Load report: number of rooms and total subscribers across them.
    pub fn load(&self) -> (usize, usize) {
        let rooms = self.rooms.len();
        let users = self
            .rooms
            .iter()
            .map(|entry| entry.value().subscriber_count())
            .sum();
        (rooms, users)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
