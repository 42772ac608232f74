//! Durable replica of users, chatroom ownership, and chat logs.
//!
//! Layout under the node's root directory:
//!
//! ```text
//! files_<id>/
//!   users.txt          username:password, append-only
//!   chatrooms.txt      chatroom:owner, append on create, rewritten on delete
//!   chatlogs/
//!     <chatroom>.txt   one formatted message line per entry
//! ```
//!
//! All file writes are serialized through a single write mutex; the
//! chatroom-delete rewrite is the only truncating operation. Per the
//! propagation policy, durable-write failures are logged and the operation
//! still reports success upstream; the at-least-once log retry at the chat
//! node compensates.

use crate::errors::DataNodeError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

const USERS_FILE: &str = "users.txt";
const CHATROOMS_FILE: &str = "chatrooms.txt";
const CHATLOGS_DIR: &str = "chatlogs";

pub struct Store {
    root: PathBuf,
    users: RwLock<HashMap<String, String>>,
    chatrooms: RwLock<HashMap<String, String>>,
    write_lock: Mutex<()>,
}

impl Store {
    /// Opens (or creates) the file tree rooted at `root` and replays
    /// `users.txt` and `chatrooms.txt` into memory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DataNodeError> {
        let root = root.into();
        fs::create_dir_all(root.join(CHATLOGS_DIR))?;

        let users = load_pairs(&root.join(USERS_FILE))?;
        let chatrooms = load_pairs(&root.join(CHATROOMS_FILE))?;
        debug!(
            root = %root.display(),
            users = users.len(),
            chatrooms = chatrooms.len(),
            "durable store opened"
        );

        Ok(Self {
            root,
            users: RwLock::new(users),
            chatrooms: RwLock::new(chatrooms),
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user_exists(&self, username: &str) -> bool {
        self.users.read().contains_key(username)
    }

    pub fn verify_user(&self, username: &str, password: &str) -> bool {
        self.users.read().get(username).map(String::as_str) == Some(password)
    }

    pub fn chatroom_exists(&self, chatroom: &str) -> bool {
        self.chatrooms.read().contains_key(chatroom)
    }

    pub fn verify_owner(&self, chatroom: &str, username: &str) -> bool {
        self.chatrooms.read().get(chatroom).map(String::as_str) == Some(username)
    }

    /// Chatrooms present in the durable store, reported to the coordinator
    /// at registration so it can re-place them.
    pub fn known_rooms(&self) -> Vec<String> {
        self.chatrooms.read().keys().cloned().collect()
    }

    /// Applies CREATEUSER. Idempotent: an existing user is left untouched.
    pub fn create_user(&self, username: &str, password: &str) {
        let _io = self.write_lock.lock();
        if self.users.read().contains_key(username) {
            return;
        }
        self.append_line(USERS_FILE, &format!("{}:{}", username, password));
        self.users
            .write()
            .insert(username.to_string(), password.to_string());
    }

    /// Applies CREATECHATROOM. Idempotent: an existing chatroom is left
    /// untouched (a concurrent creation won elsewhere).
    pub fn create_chatroom(&self, chatroom: &str, owner: &str) {
        let _io = self.write_lock.lock();
        if self.chatrooms.read().contains_key(chatroom) {
            return;
        }
        self.append_line(CHATROOMS_FILE, &format!("{}:{}", chatroom, owner));
        if let Err(e) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.chatlog_path(chatroom))
        {
            error!(chatroom, error = %e, "failed to create chat log file");
        }
        self.chatrooms
            .write()
            .insert(chatroom.to_string(), owner.to_string());
    }

    /// Applies DELETECHATROOM. Idempotent: an absent chatroom is a no-op.
    /// Rewrites `chatrooms.txt` from the surviving entries (the only
    /// truncating write in the store) and removes the chat log file.
    pub fn delete_chatroom(&self, chatroom: &str) {
        let _io = self.write_lock.lock();
        if self.chatrooms.write().remove(chatroom).is_none() {
            return;
        }
        let survivors: String = self
            .chatrooms
            .read()
            .iter()
            .map(|(name, owner)| format!("{}:{}\n", name, owner))
            .collect();
        if let Err(e) = fs::write(self.root.join(CHATROOMS_FILE), survivors) {
            error!(chatroom, error = %e, "failed to rewrite chatrooms file");
        }
        if let Err(e) = fs::remove_file(self.chatlog_path(chatroom)) {
            warn!(chatroom, error = %e, "failed to remove chat log file");
        }
    }

    /// Applies LOGMESSAGE: appends one formatted line to the chatroom's
    /// log. Never checks chatroom existence: a message racing a delete
    /// lands in a file the delete removes, and is discarded with it.
    pub fn append_chat_line(&self, chatroom: &str, line: &str) {
        let _io = self.write_lock.lock();
        let path = self.chatlog_path(chatroom);
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", line) {
                    error!(chatroom, error = %e, "failed to append chat line");
                }
            }
            Err(e) => error!(chatroom, error = %e, "failed to open chat log for append"),
        }
    }

    fn chatlog_path(&self, chatroom: &str) -> PathBuf {
        self.root.join(CHATLOGS_DIR).join(format!("{}.txt", chatroom))
    }

    fn append_line(&self, file: &str, line: &str) {
        let path = self.root.join(file);
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(mut f) => {
                if let Err(e) = writeln!(f, "{}", line) {
                    error!(file, error = %e, "failed to append record");
                }
            }
            Err(e) => error!(file, error = %e, "failed to open record file for append"),
        }
    }
}

/// Reads `key:value` lines, splitting on the first separator. Missing file
/// means an empty map (first boot).
fn load_pairs(path: &Path) -> Result<HashMap<String, String>, DataNodeError> {
    let mut map = HashMap::new();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(map),
        Err(e) => return Err(e.into()),
    };
    for line in contents.lines() {
        if line.is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => {
                map.insert(key.to_string(), value.to_string());
            }
            None => warn!(path = %path.display(), line, "skipping malformed record"),
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("files_0")).unwrap();
        (dir, store)
    }

    #[test]
    fn users_persist_across_reopen() {
        let (dir, store) = store();
        store.create_user("alice", "pw1");
        store.create_user("bob", "pw2");
        drop(store);

        let reopened = Store::open(dir.path().join("files_0")).unwrap();
        assert!(reopened.verify_user("alice", "pw1"));
        assert!(reopened.verify_user("bob", "pw2"));
        assert!(!reopened.verify_user("alice", "wrong"));
        assert!(!reopened.user_exists("carol"));
    }

    #[test]
    fn create_user_is_idempotent_on_disk() {
        let (dir, store) = store();
        store.create_user("alice", "pw");
        store.create_user("alice", "other");

        let contents = fs::read_to_string(dir.path().join("files_0").join("users.txt")).unwrap();
        assert_eq!(contents, "alice:pw\n");
        assert!(store.verify_user("alice", "pw"));
    }

    #[test]
    fn chatroom_create_and_delete_round_trip() {
        let (dir, store) = store();
        store.create_chatroom("room1", "alice");
        store.create_chatroom("room2", "bob");
        assert!(store.chatroom_exists("room1"));
        assert!(store.verify_owner("room1", "alice"));
        assert!(!store.verify_owner("room1", "bob"));
        assert!(dir
            .path()
            .join("files_0/chatlogs/room1.txt")
            .exists());

        store.delete_chatroom("room1");
        assert!(!store.chatroom_exists("room1"));
        assert!(!dir.path().join("files_0/chatlogs/room1.txt").exists());

        let contents =
            fs::read_to_string(dir.path().join("files_0").join("chatrooms.txt")).unwrap();
        assert_eq!(contents, "room2:bob\n");

        // deleting again is a no-op
        store.delete_chatroom("room1");
        assert_eq!(store.known_rooms(), vec!["room2".to_string()]);
    }

    #[test]
    fn chat_lines_append_in_order_without_dedup() {
        let (dir, store) = store();
        store.create_chatroom("room1", "alice");
        store.append_chat_line("room1", "alice >> hello");
        store.append_chat_line("room1", "alice >> hello");
        store.append_chat_line("room1", "bob >> hi");

        let contents =
            fs::read_to_string(dir.path().join("files_0/chatlogs/room1.txt")).unwrap();
        assert_eq!(contents, "alice >> hello\nalice >> hello\nbob >> hi\n");
    }

    #[test]
    fn log_append_for_unknown_room_creates_the_file() {
        let (dir, store) = store();
        store.append_chat_line("ghost", "alice >> anyone here");
        let contents = fs::read_to_string(dir.path().join("files_0/chatlogs/ghost.txt")).unwrap();
        assert_eq!(contents, "alice >> anyone here\n");
    }
}
