//! 用户存储
//! 进程内存储，由调用方构造并注入

use crate::models::user::{NewUser, User};
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Email already registered")]
    Conflict,
}

/// 认证流程依赖的用户存储接口
pub trait UserStore: Send + Sync {
    /// 根据邮箱查找用户（精确匹配）
    fn find_by_email(&self, email: &str) -> Option<User>;

    /// 分配 id 并保存；邮箱已存在时返回 `StoreError::Conflict`
    fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 以邮箱为键的内存存储
#[derive(Debug)]
pub struct InMemoryUserStore {
    users: DashMap<String, User>,
    sequence: AtomicU64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            sequence: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.get(email).map(|entry| entry.value().clone())
    }

    fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        // entry 持有分片写锁，查重与插入是原子的
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                let id = self.sequence.fetch_add(1, Ordering::SeqCst);
                let user = User {
                    id: format!("user-{}", id),
                    email: user.email,
                    name: user.name,
                    password_hash: user.password_hash,
                };
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    fn len(&self) -> usize {
        self.users.len()
    }
}
