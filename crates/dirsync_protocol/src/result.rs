//! Results of a single sync round.

use crate::action::SyncAction;
use sha2::{Digest, Sha256};
use std::fmt;
use std::hash::{Hash, Hasher};

/// SHA-256 over the canonical form of an ordered list of actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionDigest([u8; 32]);

impl ActionDigest {
    /// Computes the digest of `actions`, in order.
    pub fn of(actions: &[SyncAction]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((actions.len() as u64).to_le_bytes());
        for action in actions {
            action.digest_into(&mut hasher);
        }
        Self(hasher.finalize().into())
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ActionDigest {
    /// Writes the first 8 bytes as hex, which is enough to tell rounds apart in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// An ordered list of actions for one side of a sync round.
///
/// A list is either kept in full or compacted down to its length and
/// digest. Equality and hashing only look at `(len, digest)`, so a full
/// list compares equal to its own compacted form.
#[derive(Debug, Clone)]
pub enum ActionList {
    /// All actions are retained.
    Full {
        /// The actions, in order.
        actions: Vec<SyncAction>,
        /// Digest of `actions`.
        digest: ActionDigest,
    },
    /// Only the shape of the list is retained.
    Compacted {
        /// Number of actions in the original list.
        len: usize,
        /// Digest of the original list.
        digest: ActionDigest,
    },
}

impl ActionList {
    /// Creates a full list.
    pub fn new(actions: Vec<SyncAction>) -> Self {
        let digest = ActionDigest::of(&actions);
        ActionList::Full { actions, digest }
    }

    /// Creates an empty list.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Returns the number of actions, including compacted ones.
    pub fn len(&self) -> usize {
        match self {
            ActionList::Full { actions, .. } => actions.len(),
            ActionList::Compacted { len, .. } => *len,
        }
    }

    /// Returns true if the list holds no actions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the digest of the (original) actions.
    pub fn digest(&self) -> &ActionDigest {
        match self {
            ActionList::Full { digest, .. } | ActionList::Compacted { digest, .. } => digest,
        }
    }

    /// Returns the retained actions. Compacted lists return an empty slice.
    pub fn actions(&self) -> &[SyncAction] {
        match self {
            ActionList::Full { actions, .. } => actions,
            ActionList::Compacted { .. } => &[],
        }
    }

    /// Returns true if the actions have been discarded.
    pub fn is_compacted(&self) -> bool {
        matches!(self, ActionList::Compacted { .. })
    }

    /// Returns the compacted form of this list.
    pub fn compact(&self) -> Self {
        ActionList::Compacted {
            len: self.len(),
            digest: *self.digest(),
        }
    }
}

impl Default for ActionList {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<SyncAction>> for ActionList {
    fn from(actions: Vec<SyncAction>) -> Self {
        Self::new(actions)
    }
}

impl PartialEq for ActionList {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.digest() == other.digest()
    }
}

impl Eq for ActionList {}

impl Hash for ActionList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        self.digest().hash(state);
    }
}

impl fmt::Display for ActionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionList::Full { actions, .. } => {
                f.write_str("[")?;
                for (i, action) in actions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{action}")?;
                }
                f.write_str("]")
            }
            ActionList::Compacted { len, digest } => {
                write!(f, "<{len} actions, digest {digest}>")
            }
        }
    }
}

/// The outcome of one sync round: actions for the server and actions for the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SyncResult {
    server: ActionList,
    client: ActionList,
}

impl SyncResult {
    /// Creates a result from both action lists.
    pub fn new(server_actions: Vec<SyncAction>, client_actions: Vec<SyncAction>) -> Self {
        Self {
            server: ActionList::new(server_actions),
            client: ActionList::new(client_actions),
        }
    }

    /// Creates a result without any actions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a result with actions for the client only.
    pub fn for_client(client_actions: Vec<SyncAction>) -> Self {
        Self::new(Vec::new(), client_actions)
    }

    /// Returns the server-bound list.
    pub fn server(&self) -> &ActionList {
        &self.server
    }

    /// Returns the client-bound list.
    pub fn client(&self) -> &ActionList {
        &self.client
    }

    /// Returns the retained server-bound actions.
    pub fn server_actions(&self) -> &[SyncAction] {
        self.server.actions()
    }

    /// Returns the retained client-bound actions.
    pub fn client_actions(&self) -> &[SyncAction] {
        self.client.actions()
    }

    /// Returns the total number of actions on both sides.
    pub fn len(&self) -> usize {
        self.server.len() + self.client.len()
    }

    /// Returns true if neither side has actions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if either side has been compacted.
    pub fn is_compacted(&self) -> bool {
        self.server.is_compacted() || self.client.is_compacted()
    }

    /// Returns a copy with both sides compacted. The copy compares equal to `self`.
    pub fn compact(&self) -> Self {
        Self {
            server: self.server.compact(),
            client: self.client.compact(),
        }
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server={} client={}", self.server, self.client)
    }
}
