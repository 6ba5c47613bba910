//! Registry of live rooms keyed by their short human-typed codes.

use dashmap::{DashMap, mapref::entry::Entry};
use rand::Rng;
use tokio::sync::{broadcast, mpsc};

use crate::services::room_actor::{RoomCommand, RoomEvent};

/// Alphabet for generated codes: lowercase letters and digits with the
/// visually ambiguous `0`, `o`, `1`, `l` and `i` left out.
const CODE_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

/// Handle to a live room: the command queue owned by its actor task and the
/// broadcast channel its events fan out on.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    /// Code the room is registered under.
    pub code: String,
    /// Serial command queue; all mutation goes through here.
    pub commands: mpsc::Sender<RoomCommand>,
    /// Fan-out channel gateway sessions subscribe to.
    pub events: broadcast::Sender<RoomEvent>,
}

/// In-memory map of live rooms.
///
/// Mutual exclusion is only needed around code reservation and removal; all
/// in-room processing is serialized by each room's actor task.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: DashMap<String, RoomHandle>,
    code_length: usize,
}

impl RoomRegistry {
    /// Create an empty registry generating codes of the given length.
    pub fn new(code_length: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            code_length,
        }
    }

    /// Reserve a fresh unique code and bind the room's channels to it.
    ///
    /// Collisions are retried, never surfaced: the entry API makes the
    /// probe-and-insert atomic per code, so two concurrent registrations can
    /// never claim the same one.
    pub fn register(
        &self,
        commands: mpsc::Sender<RoomCommand>,
        events: broadcast::Sender<RoomEvent>,
    ) -> RoomHandle {
        loop {
            let code = self.generate_code();
            match self.rooms.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let handle = RoomHandle {
                        code,
                        commands: commands.clone(),
                        events: events.clone(),
                    };
                    slot.insert(handle.clone());
                    return handle;
                }
            }
        }
    }

    /// Look up a room by code. Codes are case-insensitive on entry.
    pub fn find(&self, code: &str) -> Option<RoomHandle> {
        let normalized = normalize_code(code);
        self.rooms.get(&normalized).map(|entry| entry.value().clone())
    }

    /// Drop a room's handle, freeing its code for reuse by future rooms.
    pub fn remove(&self, code: &str) {
        self.rooms.remove(&normalize_code(code));
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms are live.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn generate_code(&self) -> String {
        let mut rng = rand::rng();
        (0..self.code_length)
            .map(|_| {
                let index = rng.random_range(0..CODE_ALPHABET.len());
                CODE_ALPHABET[index] as char
            })
            .collect()
    }
}

/// Lowercase and trim a human-typed code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}
