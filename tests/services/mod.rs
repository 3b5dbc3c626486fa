mod chats;
mod members;
mod messages;
