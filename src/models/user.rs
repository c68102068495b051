use serde::{Deserialize, Serialize};

/// Represents a user in the system. The id is an opaque UUID string;
/// email is unique across the collection.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub image: Option<String>,
}

/// The subset of a user record safe to hand to clients.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
        }
    }
}

/// Minimal pair used by assignment pickers.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
}
