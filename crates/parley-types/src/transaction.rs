use serde::{Deserialize, Serialize};

/// Operation kind carried by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Op {
    CreateUser,
    CreateChatroom,
    DeleteChatroom,
    LogMessage,
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Op::CreateUser => "CREATEUSER",
            Op::CreateChatroom => "CREATECHATROOM",
            Op::DeleteChatroom => "DELETECHATROOM",
            Op::LogMessage => "LOGMESSAGE",
        };
        f.write_str(name)
    }
}

/// A unit of replicated work, immutable once constructed.
///
/// `index` is allocated by the coordinator, monotonically increasing and
/// unique within one coordinator lifetime. It is the sole transaction
/// identifier exchanged between the coordinator and its participants.
///
/// The meaning of `key`/`value` depends on `op`:
/// - `CreateUser`: username / password
/// - `CreateChatroom`: chatroom name / owner username
/// - `DeleteChatroom`: chatroom name / requesting username
/// - `LogMessage`: chatroom name / already-formatted message line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub index: u64,
    pub op: Op,
    pub key: String,
    pub value: String,
}

impl Transaction {
    pub fn new(index: u64, op: Op, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            index,
            op,
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_wire_names_are_screaming_snake() {
        let json = serde_json::to_string(&Op::CreateChatroom).unwrap();
        assert_eq!(json, "\"CREATE_CHATROOM\"");
    }

    #[test]
    fn transaction_round_trips() {
        let t = Transaction::new(7, Op::LogMessage, "room1", "alice >> hi");
        let back: Transaction = serde_json::from_str(&serde_json::to_string(&t).unwrap()).unwrap();
        assert_eq!(back, t);
    }
}
