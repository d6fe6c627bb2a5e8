//! UI-thread ownership: the posting primitive, the events workers send, and
//! the view model that absorbs them.

pub mod events;
pub mod post;
pub mod state;

pub use events::{UiEvent, View};
pub use post::{EventLoop, Poster, UiCallback, ui_channel};
pub use state::{ChatLine, Speaker, UiState};
