pub mod base;
pub mod channel;
pub mod message;
pub mod reaction;
pub mod team;
pub mod user;

pub use base::{PaginatedResult, PaginationParams, StoreError, StoreResult};
pub use channel::ChannelRepo;
pub use message::MessageRepo;
pub use reaction::ReactionRepo;
pub use team::TeamRepo;
pub use user::UserRepo;
