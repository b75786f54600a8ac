// Use cases layer: client workflows between user input, the room channel and the screen.

pub mod channel;
pub mod commands;
pub mod render;
pub mod session;
pub mod types;

pub use channel::{ChannelState, Delivery, SyncChannel};
pub use render::{DrawCommand, Frame, FrameInput, Hud, Paint, Viewport, render};
pub use session::{FramePresenter, LoopControl, Session, SessionSummary};
pub use types::{
    Inbound, JoinIdentity, Outbound, PointerButton, PointerEvent, SessionEvent, TransportEvent,
    UserCommand,
};
