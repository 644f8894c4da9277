mod channel;
mod channel_member;
mod message;
mod reaction;
mod team;
mod team_member;
mod user;

pub use channel::*;
pub use channel_member::*;
pub use message::*;
pub use reaction::*;
pub use team::*;
pub use team_member::*;
pub use user::*;
