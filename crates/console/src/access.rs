//! Console-level bucket access.
//!
//! The console exposes three coarse access levels instead of the storage
//! server's full policy language. The mapping is lossy on purpose: any
//! policy that is neither the canned read-write grant nor empty shows up as
//! [`BucketAccess::Custom`], and the setter only ever writes
//! [`BucketAccess::Private`] or [`BucketAccess::Public`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use storage::policy::BucketPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum BucketAccess {
    /// No public statements
    Private,
    /// Read-write for everyone
    Public,
    /// Any other policy shape
    Custom,
}

impl BucketAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketAccess::Private => "PRIVATE",
            BucketAccess::Public => "PUBLIC",
            BucketAccess::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for BucketAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bucket access `{0}`")]
pub struct UnknownAccess(pub String);

impl FromStr for BucketAccess {
    type Err = UnknownAccess;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIVATE" => Ok(BucketAccess::Private),
            "PUBLIC" => Ok(BucketAccess::Public),
            "CUSTOM" => Ok(BucketAccess::Custom),
            other => Err(UnknownAccess(other.to_string())),
        }
    }
}

/// Canned policy written for a console access level.
///
/// Only PUBLIC grants anything; CUSTOM has no canned form.
pub fn access_to_policy(access: BucketAccess) -> BucketPolicy {
    match access {
        BucketAccess::Public => BucketPolicy::ReadWrite,
        BucketAccess::Private | BucketAccess::Custom => BucketPolicy::None,
    }
}

/// Console access level for a canned policy.
pub fn policy_to_access(policy: BucketPolicy) -> BucketAccess {
    match policy {
        BucketPolicy::ReadWrite => BucketAccess::Public,
        BucketPolicy::None => BucketAccess::Private,
        BucketPolicy::ReadOnly | BucketPolicy::WriteOnly => BucketAccess::Custom,
    }
}
