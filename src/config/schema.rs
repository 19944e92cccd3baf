use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Admin mode (bulk cutoffs, exports) is refused unless this is set.
    pub admin_enabled: bool,
    /// Argon2 PHC hash of the admin password (`marks-calc hash-password`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password_hash: Option<String>,
    pub scoring: ScoringConfig,
    /// Extra header spellings, keyed by canonical column name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, Vec<String>>,
}
