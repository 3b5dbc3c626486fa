//! In-process store
//!
//! Implements the same repository contracts as the PostgreSQL session on
//! plain collections. Sessions are serialized: `begin` takes the store lock
//! and works on a copy of the state, `commit` writes the copy back and
//! dropping the session discards it. Unique keys, cascades and the owner
//! restriction mirror the SQL schema.
//!
//! Selected with `database.url = "memory://"` and used by the test suites.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::{
    AuthoredMessage, Chat, ChatRepository, Member, MemberRepository, MemberUnread, Message,
    MessageRepository, NewChat, NewMessage, NewUser, PageDirection, SessionFactory, UnitOfWork,
    User, UserRepository,
};
use crate::shared::error::AppError;
use crate::shared::validation::normalize_key;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<Uuid, User>,
    chats: BTreeMap<Uuid, Chat>,
    members: Vec<Member>,
    /// In insertion order, which is also timestamp order
    messages: Vec<Message>,
    /// Last timestamp handed out
    clock: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Current time at microsecond precision, never behind the last stamp.
    fn now(&self) -> DateTime<Utc> {
        let now = truncate_to_micros(Utc::now());
        match self.clock {
            Some(last) if last > now => last,
            _ => now,
        }
    }

    /// A strictly increasing timestamp for a new row.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = truncate_to_micros(Utc::now());
        let stamp = match self.clock {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.clock = Some(stamp);
        stamp
    }

    fn member(&self, chat_id: Uuid, user_id: Uuid) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.chat_id == chat_id && m.user_id == user_id)
    }

    fn author_name(&self, author_id: Uuid) -> String {
        self.users
            .get(&author_id)
            .map(|u| u.name.clone())
            .unwrap_or_default()
    }

    fn authored(&self, message: &Message) -> AuthoredMessage {
        AuthoredMessage {
            message: message.clone(),
            author_name: self.author_name(message.author_id),
        }
    }

    fn unread_for(&self, member: &Member) -> i64 {
        self.messages
            .iter()
            .filter(|m| m.chat_id == member.chat_id && member.is_unread(m.created_at, m.author_id))
            .count() as i64
    }

    fn key_taken<F>(&self, value: &str, except: Option<Uuid>, field: F) -> bool
    where
        F: Fn(&User) -> &str,
    {
        let key = normalize_key(value);
        self.users
            .values()
            .any(|u| Some(u.id) != except && normalize_key(field(u)) == key)
    }

    fn ensure_unique(&self, user: &User) -> Result<(), AppError> {
        if self.key_taken(&user.name, Some(user.id), |u| &u.name)
            || self.key_taken(&user.login, Some(user.id), |u| &u.login)
        {
            return Err(AppError::Conflict("Name or login is already used".into()));
        }
        Ok(())
    }
}

fn truncate_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(at.timestamp_micros()).unwrap_or(at)
}

/// Shared in-process store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A session on the in-process store. Holds the store lock until dropped.
pub struct MemorySession {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

#[async_trait]
impl SessionFactory for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(MemorySession { guard, work })
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemorySession {
    async fn now(&mut self) -> Result<DateTime<Utc>, AppError> {
        Ok(self.work.now())
    }

    async fn commit(mut self) -> Result<(), AppError> {
        *self.guard = std::mem::take(&mut self.work);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemorySession {
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.work.users.get(&id).cloned())
    }

    async fn find_user_by_login(&mut self, login: &str) -> Result<Option<User>, AppError> {
        let key = normalize_key(login);
        Ok(self
            .work
            .users
            .values()
            .find(|u| normalize_key(&u.login) == key)
            .cloned())
    }

    async fn find_users(&mut self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.work.users.get(id).cloned())
            .collect())
    }

    async fn search_users(&mut self, search: Option<&str>) -> Result<Vec<User>, AppError> {
        let needle = search.map(str::to_lowercase);
        let mut users: Vec<User> = self
            .work
            .users
            .values()
            .filter(|u| match &needle {
                Some(needle) => u.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn is_name_used(&mut self, name: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        Ok(self.work.key_taken(name, except, |u| &u.name))
    }

    async fn is_login_used(&mut self, login: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        Ok(self.work.key_taken(login, except, |u| &u.login))
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, AppError> {
        let user = User {
            id: Uuid::now_v7(),
            created_at: self.work.tick(),
            name: user.name,
            login: user.login,
            secret_key_hash: user.secret_key_hash,
        };
        self.work.ensure_unique(&user)?;
        self.work.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&mut self, user: &User) -> Result<(), AppError> {
        if !self.work.users.contains_key(&user.id) {
            return Err(AppError::NotFound(format!("User {} not found", user.id)));
        }
        self.work.ensure_unique(user)?;
        self.work.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&mut self, id: Uuid) -> Result<(), AppError> {
        if self.work.chats.values().any(|c| c.owner_id == id) {
            return Err(AppError::Conflict("User still owns chats".into()));
        }
        if self.work.users.remove(&id).is_some() {
            self.work.members.retain(|m| m.user_id != id);
            self.work.messages.retain(|m| m.author_id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl ChatRepository for MemorySession {
    async fn find_chat(&mut self, id: Uuid) -> Result<Option<Chat>, AppError> {
        Ok(self.work.chats.get(&id).cloned())
    }

    async fn find_chats_for_user(&mut self, user_id: Uuid) -> Result<Vec<Chat>, AppError> {
        let mut chats: Vec<Chat> = self
            .work
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| self.work.chats.get(&m.chat_id).cloned())
            .collect();
        chats.sort_by_key(|c| c.created_at);
        Ok(chats)
    }

    async fn count_chats_owned_by(&mut self, user_id: Uuid) -> Result<i64, AppError> {
        Ok(self.work.chats.values().filter(|c| c.owner_id == user_id).count() as i64)
    }

    async fn insert_chat(&mut self, chat: NewChat) -> Result<Chat, AppError> {
        if !self.work.users.contains_key(&chat.owner_id) {
            return Err(AppError::Internal(format!("Owner {} does not exist", chat.owner_id)));
        }
        let chat = Chat {
            id: Uuid::now_v7(),
            created_at: self.work.tick(),
            is_private: chat.is_private,
            name: chat.name,
            owner_id: chat.owner_id,
        };
        self.work.chats.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn update_chat(&mut self, chat: &Chat) -> Result<(), AppError> {
        match self.work.chats.get_mut(&chat.id) {
            Some(stored) => {
                stored.name = chat.name.clone();
                stored.owner_id = chat.owner_id;
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Chat {} not found", chat.id))),
        }
    }

    async fn delete_chat(&mut self, id: Uuid) -> Result<(), AppError> {
        if self.work.chats.remove(&id).is_some() {
            self.work.members.retain(|m| m.chat_id != id);
            self.work.messages.retain(|m| m.chat_id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl MemberRepository for MemorySession {
    async fn find_member(&mut self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Member>, AppError> {
        Ok(self.work.member(chat_id, user_id).cloned())
    }

    async fn find_members(&mut self, chat_id: Uuid) -> Result<Vec<Member>, AppError> {
        Ok(self
            .work
            .members
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect())
    }

    async fn find_member_users(&mut self, chat_id: Uuid) -> Result<Vec<User>, AppError> {
        Ok(self
            .work
            .members
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .filter_map(|m| self.work.users.get(&m.user_id).cloned())
            .collect())
    }

    async fn find_counterpart_names(
        &mut self,
        user_id: Uuid,
        chat_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, String)>, AppError> {
        Ok(chat_ids
            .iter()
            .filter_map(|chat_id| {
                self.work
                    .members
                    .iter()
                    .find(|m| m.chat_id == *chat_id && m.user_id != user_id)
                    .and_then(|m| self.work.users.get(&m.user_id))
                    .map(|u| (*chat_id, u.name.clone()))
            })
            .collect())
    }

    async fn insert_member(&mut self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Member>, AppError> {
        if self.work.member(chat_id, user_id).is_some() {
            return Ok(None);
        }
        if !self.work.chats.contains_key(&chat_id) || !self.work.users.contains_key(&user_id) {
            return Err(AppError::Internal(format!(
                "Chat {} or user {} does not exist",
                chat_id, user_id
            )));
        }

        let joined = self.work.tick();
        let member = Member {
            id: Uuid::now_v7(),
            chat_id,
            user_id,
            last_read_at: joined,
            created_at: joined,
        };
        self.work.members.push(member.clone());
        Ok(Some(member))
    }

    async fn delete_member(&mut self, chat_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let before = self.work.members.len();
        self.work
            .members
            .retain(|m| !(m.chat_id == chat_id && m.user_id == user_id));
        Ok(self.work.members.len() < before)
    }

    async fn update_last_read(
        &mut self,
        chat_id: Uuid,
        user_id: Uuid,
        last_read_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        match self
            .work
            .members
            .iter_mut()
            .find(|m| m.chat_id == chat_id && m.user_id == user_id)
        {
            Some(member) => {
                member.last_read_at = truncate_to_micros(last_read_at);
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "User {} is not a member of chat {}",
                user_id, chat_id
            ))),
        }
    }
}

#[async_trait]
impl MessageRepository for MemorySession {
    async fn insert_message(&mut self, message: NewMessage) -> Result<Message, AppError> {
        if !self.work.chats.contains_key(&message.chat_id) || !self.work.users.contains_key(&message.author_id) {
            return Err(AppError::Internal(format!(
                "Chat {} or author {} does not exist",
                message.chat_id, message.author_id
            )));
        }

        let message = Message {
            id: Uuid::now_v7(),
            created_at: self.work.tick(),
            text: message.text,
            author_id: message.author_id,
            chat_id: message.chat_id,
        };
        self.work.messages.push(message.clone());
        Ok(message)
    }

    async fn find_last_messages(&mut self, chat_ids: &[Uuid]) -> Result<Vec<AuthoredMessage>, AppError> {
        Ok(chat_ids
            .iter()
            .filter_map(|chat_id| {
                self.work
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.chat_id == *chat_id)
                    .map(|m| self.work.authored(m))
            })
            .collect())
    }

    async fn count_unread_for_user(
        &mut self,
        user_id: Uuid,
        chat_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, i64)>, AppError> {
        Ok(chat_ids
            .iter()
            .filter_map(|chat_id| self.work.member(*chat_id, user_id))
            .map(|member| (member.chat_id, self.work.unread_for(member)))
            .filter(|(_, unread)| *unread > 0)
            .collect())
    }

    async fn count_unread_by_member(&mut self, chat_id: Uuid) -> Result<Vec<MemberUnread>, AppError> {
        Ok(self
            .work
            .members
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| MemberUnread {
                user_id: m.user_id,
                last_read_at: m.last_read_at,
                unread: self.work.unread_for(m),
            })
            .collect())
    }

    async fn find_messages(
        &mut self,
        chat_id: Uuid,
        pivot: DateTime<Utc>,
        direction: PageDirection,
        inclusive: bool,
        limit: i64,
    ) -> Result<Vec<AuthoredMessage>, AppError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let in_chat = self.work.messages.iter().filter(|m| m.chat_id == chat_id);

        let page: Vec<&Message> = match direction {
            PageDirection::Older => in_chat
                .filter(|m| m.created_at < pivot || (inclusive && m.created_at == pivot))
                .rev()
                .take(limit)
                .collect(),
            PageDirection::Newer => {
                let mut page: Vec<&Message> =
                    in_chat.filter(|m| m.created_at > pivot).take(limit).collect();
                page.reverse();
                page
            }
        };

        Ok(page.into_iter().map(|m| self.work.authored(m)).collect())
    }
}
