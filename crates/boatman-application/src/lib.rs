//! Application services for the Boatman renderer engine.
//!
//! Services composed over `boatman-core`: the event dispatcher that drains
//! backend events into the store, the session use-case carrying user intents,
//! the approval coordinator, the message paginator, preference and search
//! wrappers, the transient error bus, overlay/shortcut state, and the
//! [`AppContext`] composition root that wires it all over a bridge.

pub mod app;
pub mod approvals;
pub mod dispatcher;
pub mod error_bus;
pub mod overlay;
pub mod paginator;
pub mod preferences;
pub mod search;
pub mod session_usecase;
pub mod testing;

pub use app::AppContext;
pub use approvals::ApprovalCoordinator;
pub use dispatcher::EventDispatcher;
pub use error_bus::{ErrorBanner, UiErrorBus};
pub use overlay::{Key, KeyChord, Overlay, OverlayController};
pub use paginator::MessagePaginator;
pub use preferences::PreferencesStore;
pub use search::SearchClient;
pub use session_usecase::SessionUseCase;
