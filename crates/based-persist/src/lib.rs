pub mod dbs;
pub mod error;
pub mod models;
pub mod trait_client;

pub use dbs::memory::InMemoryPersistenceClient;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
pub use error::{PersistError, Result};
pub use models::{Conversation, Message, MessageRole, User, PLACEHOLDER_TITLE};
pub use trait_client::PersistenceClient;
