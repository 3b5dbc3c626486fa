mod chat_tests;
mod user_tests;
