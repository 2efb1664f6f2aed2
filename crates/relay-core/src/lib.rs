pub mod actions;
pub mod approval;
pub mod config;
pub mod events;
pub mod phases;
pub mod protocol;
pub mod reducer;
pub mod state;
pub mod streaming;
pub mod view;

pub use actions::*;
pub use approval::*;
pub use config::*;
pub use events::*;
pub use phases::*;
pub use protocol::*;
pub use reducer::*;
pub use state::*;
pub use streaming::*;
