use super::{EntityKey, EntityKind, typed};
use crate::{Datastore, Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
}

impl User {
    pub fn key(&self) -> EntityKey {
        EntityKey::User(self.id.clone())
    }

    pub async fn by_id(
        db: &dyn Datastore,
        id: &str,
    ) -> Result<User> {
        db.lookup(&EntityKey::User(id.to_string()))
            .await?
            .and_then(|entity| User::try_from(entity).ok())
            .ok_or_else(|| Error::NotFound(format!("user `{id}`")))
    }

    pub async fn by_email(
        db: &dyn Datastore,
        email: &str,
    ) -> Result<Option<User>> {
        Ok(typed::<User>(db.query(EntityKind::User).await?)
            .into_iter()
            .find(|user| user.email == email))
    }
}
