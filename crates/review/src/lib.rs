// Interactive review of the chunks between a baseline and a working text
// Sessions, debounced rebuilds, anchored controls and group aggregation

mod clock;
mod edits;
mod error;
mod identity;
mod ids;
mod options;
mod overlay;
mod registry;
mod scheduler;
mod session;
mod surface;

pub use clock::{Clock, ManualClock, SystemClock};
pub use edits::{map_through, EditDelta};
pub use error::{ReviewError, StaleTarget, SurfaceError};
pub use identity::IdentityDiff;
pub use ids::{GroupId, SessionId};
pub use options::SessionOptions;
pub use overlay::{AnchorMode, ChunkAction, OverlayControl, OverlayEvent, OverlayRenderer};
pub use registry::{GroupStatus, ReviewCommand, SessionHandle, SessionRegistry, SubscriptionId};
pub use scheduler::{RebuildScheduler, DEFAULT_QUIET_PERIOD};
pub use session::{
    DiffSession, EventSink, Recomputed, RevertOutcome, SessionBuilder, SessionEvent,
    SessionEventKind, SessionStatus,
};
pub use surface::{EditingSurface, LayoutQuery, ScrollOffset, Selection, ViewState};

pub use buffer_diff;
