use async_trait::async_trait;

use super::domain::StoredUser;
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use models::user::Role;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, StoredUser>>, // key: username
    }

    impl MockAuthRepository {
        /// Insert an account with a freshly hashed password.
        pub fn add_user(&self, username: &str, password: &str, role: Role) -> StoredUser {
            let hash = crate::auth::service::hash_password(password).expect("hash password");
            let user = StoredUser {
                id: Uuid::new_v4(),
                username: username.to_string(),
                role,
                password_hash: hash,
            };
            self.users.lock().unwrap().insert(username.to_string(), user.clone());
            user
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(username).cloned())
        }
    }
}
