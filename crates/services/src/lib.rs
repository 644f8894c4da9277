pub mod auth;
pub mod authorizer;
pub mod engine;
pub mod events;
pub mod presence;
pub mod registry;
pub mod repo;

pub use auth::AuthService;
pub use authorizer::MembershipAuthorizer;
pub use engine::ConversationEngine;
pub use presence::PresenceTracker;
pub use registry::ConnectionRegistry;
