//! Messages as seen by the fault-injection layer.

/// Index of a node within a scenario's network.
pub type NodeIndex = usize;

/// The parts of a message the fault layer reads and rewrites.
///
/// The layer only touches the sender and the payload, so any substrate
/// message type can implement this and go through
/// [`ByzantineManager::modify`](crate::ByzantineManager::modify).
pub trait ByzantineMessage {
    /// Node that sent the message.
    fn owner(&self) -> NodeIndex;

    /// Payload values, up to the declared size.
    fn payload(&self) -> &[i32];

    /// Mutable payload values, up to the declared size.
    fn payload_mut(&mut self) -> &mut [i32];
}

/// Broadcast message carrying integer payload values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    owner: NodeIndex,
    payload: Vec<i32>,
}

impl Message {
    /// Create a message sent by `owner`.
    pub fn new(owner: NodeIndex, payload: impl Into<Vec<i32>>) -> Self {
        Self {
            owner,
            payload: payload.into(),
        }
    }

    /// Declared payload size.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Consume the message and return its payload.
    pub fn into_payload(self) -> Vec<i32> {
        self.payload
    }
}

impl ByzantineMessage for Message {
    fn owner(&self) -> NodeIndex {
        self.owner
    }

    fn payload(&self) -> &[i32] {
        &self.payload
    }

    fn payload_mut(&mut self) -> &mut [i32] {
        &mut self.payload
    }
}
