pub mod filter_map;
pub mod registry;
pub mod session;
pub mod surface;

pub use registry::KeyRegistry;
pub use session::{NoneRestorePolicy, SelectionSession, SessionEvent, SurfaceKind, Transition, UiEffect};
pub use surface::{IgnoreReason, MenuItem};
