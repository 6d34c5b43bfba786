//! Resolution of user ids to display names for group conversations.
//!
//! Results are cached for the lifetime of the directory. Each user id owns a
//! [`OnceCell`], so concurrent resolutions of the same id share a single
//! outstanding lookup. Failed lookups are not cached.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, warn};

use parley_net::RemoteStore;
use parley_shared::{Result, SessionContext, SyncError, User, UserId};

#[derive(Clone)]
pub struct SenderDirectory {
    remote: Arc<dyn RemoteStore>,
    session: Arc<SessionContext>,
    cache: Arc<RwLock<HashMap<UserId, Arc<OnceCell<User>>>>>,
}

impl SenderDirectory {
    pub fn new(remote: Arc<dyn RemoteStore>, session: Arc<SessionContext>) -> Self {
        Self {
            remote,
            session,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolve `user`, from cache when possible.
    pub async fn resolve(&self, user: UserId) -> Result<User> {
        let cell = self.cell_for(user).await;
        let resolved = cell
            .get_or_try_init(|| async {
                debug!(user = %user, "Resolving sender");
                self.remote
                    .resolve_user(&self.session, user)
                    .await
                    .map_err(|e| SyncError::Lookup {
                        user,
                        reason: e.to_string(),
                    })
            })
            .await?;
        Ok(resolved.clone())
    }

    /// Resolve every distinct id in `users` concurrently, one lookup per id.
    pub async fn resolve_many(
        &self,
        users: impl IntoIterator<Item = UserId>,
    ) -> HashMap<UserId, Result<User>> {
        let distinct: BTreeSet<UserId> = users.into_iter().collect();
        let lookups = distinct
            .into_iter()
            .map(|user| async move { (user, self.resolve(user).await) });
        join_all(lookups).await.into_iter().collect()
    }

    /// Display names for `users`. A user that cannot be resolved is shown by
    /// raw id.
    pub async fn display_names(
        &self,
        users: impl IntoIterator<Item = UserId>,
    ) -> HashMap<UserId, String> {
        self.resolve_many(users)
            .await
            .into_iter()
            .map(|(user, resolved)| {
                let name = match resolved {
                    Ok(u) => display_name_of(&u),
                    Err(e) => {
                        warn!(user = %user, error = %e, "Sender lookup failed, showing raw id");
                        user.to_string()
                    }
                };
                (user, name)
            })
            .collect()
    }

    /// The cached entry for `user`, without a lookup.
    pub async fn cached(&self, user: UserId) -> Option<User> {
        let cache = self.cache.read().await;
        cache.get(&user).and_then(|cell| cell.get().cloned())
    }

    async fn cell_for(&self, user: UserId) -> Arc<OnceCell<User>> {
        {
            let cache = self.cache.read().await;
            if let Some(cell) = cache.get(&user) {
                return cell.clone();
            }
        }
        let mut cache = self.cache.write().await;
        cache.entry(user).or_default().clone()
    }
}

fn display_name_of(user: &User) -> String {
    let name = user.full_name();
    if name.is_empty() {
        user.id.to_string()
    } else {
        name
    }
}
