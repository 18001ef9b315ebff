//! Client core for the PrepSpace dashboard: who is signed in, which spaces
//! they can see, and which one is active.

pub mod api;
pub mod app;
pub mod config;
pub mod directory;
pub mod errors;
pub mod guest;
pub mod models;
pub mod router;
pub mod session;
pub mod storage;
pub mod switcher;

#[cfg(test)]
mod testing;

pub use app::{App, StartMode};
pub use directory::{DirectoryState, FetchOutcome, SelectedVia, SpaceDirectory};
pub use errors::ClientError;
pub use session::{SessionState, SessionStore};
pub use switcher::SpaceSwitcher;
