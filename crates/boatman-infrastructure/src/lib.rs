//! Infrastructure implementations for the Boatman renderer engine.
//!
//! Concrete transports and storage behind the seams `boatman-core` defines:
//! the channel-backed bridge and the persisted UI-state blob.

mod channel_bridge;
mod ui_state;

pub use channel_bridge::{CALL_DEADLINE, ChannelBridge, InboundFrame, OutboundFrame};
pub use ui_state::TomlUiStateRepository;
