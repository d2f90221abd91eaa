//! Domain layer: pure state and the seams the session layer depends on.

pub mod chat_state;
pub mod connection_state;
pub mod error;
pub mod event;
pub mod message;
pub mod queue;
pub mod transport;
pub mod typing;
pub mod value_object;

pub use chat_state::{ChatState, ChatUpdate};
pub use connection_state::{BackoffPolicy, ConnectionAction, ConnectionMachine, ConnectionState};
pub use error::{QueueError, TransportError, ValueObjectError};
pub use event::{InboundEvent, IncomingMessage};
pub use message::{MESSAGE_TOMBSTONE, Message, OutboundPayload, PayloadKind, ReplyRef};
pub use queue::{FlushPolicy, OutboundQueue, QueueEntry};
pub use transport::{Connector, Endpoint, Link};
pub use typing::{TypingDebouncer, TypingSignal};
pub use value_object::{Credential, MessageId, RoomId, UserId};
