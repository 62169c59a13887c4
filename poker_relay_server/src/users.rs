//! 用户凭证存储。
//!
//! 创建用户时生成一个随机令牌返回给用户，只保存它的 Argon2 哈希。

use crate::error::{validate_name, RelayError};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use dashmap::{mapref::entry::Entry, DashMap};
use poker_relay_core::Username;
use uuid::Uuid;

#[derive(Default)]
pub struct UserStore {
    // 用户名 -> 令牌哈希
    accounts: DashMap<Username, String>,
}

impl UserStore {
    pub fn new() -> UserStore {
        UserStore::default()
    }

    /// 创建用户，返回 (用户名, 令牌)。用户名已存在时失败
    pub fn create_user(&self, username: &str) -> Result<(Username, String), RelayError> {
        validate_name(username)?;
        if self.accounts.contains_key(username) {
            return Err(RelayError::DuplicateUser(username.to_string()));
        }
        // 哈希很慢，不能在持有分片锁时计算
        let token = Uuid::new_v4().simple().to_string();
        let hash = hash_token(&token)?;
        match self.accounts.entry(username.to_string()) {
            Entry::Occupied(_) => Err(RelayError::DuplicateUser(username.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(hash);
                Ok((username.to_string(), token))
            }
        }
    }

    /// 令牌是否属于该用户；用户不存在也返回 false
    pub fn verify(&self, username: &str, token: &str) -> bool {
        let Some(hash) = self.accounts.get(username).map(|h| h.clone()) else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(&hash) else {
            return false;
        };
        Argon2::default().verify_password(token.as_bytes(), &parsed).is_ok()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }
}

fn hash_token(token: &str) -> Result<String, RelayError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(token.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| RelayError::HashingFailed)
}
