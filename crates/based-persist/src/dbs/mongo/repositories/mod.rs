pub mod conversation;
pub mod counter;
pub mod message;
pub mod user;

pub use conversation::MongoConversationRepository;
pub use counter::MongoCounterRepository;
pub use message::MongoMessageRepository;
pub use user::MongoUserRepository;
