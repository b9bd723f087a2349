//! Private per-user, per-item estimates.

use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::ids::{ItemId, UserId};

/// One user's estimate for one item.
///
/// The composite identity is `(user, item)`: submitting again replaces the
/// value rather than adding a row. Equality and hashing ignore `value` for
/// that reason. Estimates never travel over a session channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    /// Estimating user.
    pub user_id: UserId,
    /// Estimated item.
    pub item_id: ItemId,
    /// The chosen duration.
    pub value: Duration,
}

impl Estimate {
    /// Create an estimate.
    #[must_use]
    pub fn new(user_id: UserId, item_id: ItemId, value: Duration) -> Self {
        Self {
            user_id,
            item_id,
            value,
        }
    }
}

impl PartialEq for Estimate {
    fn eq(&self, other: &Self) -> bool {
        self.user_id == other.user_id && self.item_id == other.item_id
    }
}

impl Eq for Estimate {}

impl std::hash::Hash for Estimate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.user_id.hash(state);
        self.item_id.hash(state);
    }
}
