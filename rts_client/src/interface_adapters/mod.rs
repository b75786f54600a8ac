// Interface adapters: wire protocol, socket transport, text input and frame output.

pub mod input;
pub mod net;
pub mod presenter;
pub mod protocol;
pub mod utils;
