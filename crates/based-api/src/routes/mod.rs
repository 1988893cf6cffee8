pub mod chats;
pub mod health;
pub mod users;
