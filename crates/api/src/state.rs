use std::sync::Arc;
use std::time::Duration;

use huddle_config::Settings;
use huddle_db::Db;
use huddle_services::{
    AuthService, ConnectionRegistry, ConversationEngine, MembershipAuthorizer, PresenceTracker,
    repo::{ChannelRepo, MessageRepo, ReactionRepo, TeamRepo, UserRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserRepo>,
    pub teams: Arc<TeamRepo>,
    pub channels: Arc<ChannelRepo>,
    pub messages: Arc<MessageRepo>,
    pub reactions: Arc<ReactionRepo>,
    pub authorizer: Arc<MembershipAuthorizer>,
    pub engine: Arc<ConversationEngine>,
    pub registry: Arc<ConnectionRegistry>,
    pub presence: Arc<PresenceTracker>,
}

impl AppState {
    pub fn new(db: Arc<Db>, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserRepo::new(db.clone()));
        let teams = Arc::new(TeamRepo::new(db.clone()));
        let channels = Arc::new(ChannelRepo::new(db.clone()));
        let messages = Arc::new(MessageRepo::new(db.clone()));
        let reactions = Arc::new(ReactionRepo::new(db));
        let authorizer = Arc::new(MembershipAuthorizer::new(teams.clone(), channels.clone()));
        let registry = Arc::new(ConnectionRegistry::new());
        let presence = Arc::new(PresenceTracker::new(users.clone()));
        let engine = Arc::new(ConversationEngine::new(
            users.clone(),
            teams.clone(),
            channels.clone(),
            messages.clone(),
            reactions.clone(),
            authorizer.clone(),
            registry.clone(),
            Duration::from_millis(settings.engine.op_timeout_ms),
        ));

        Self {
            settings,
            auth,
            users,
            teams,
            channels,
            messages,
            reactions,
            authorizer,
            engine,
            registry,
            presence,
        }
    }
}
