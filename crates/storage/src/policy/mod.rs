//! Bucket policy documents.
//!
//! The storage server keeps bucket access rules as an IAM-style JSON
//! document. This module models that document and provides the canned
//! policy helpers ([`set_policy`], [`get_policy`]) that translate between
//! statement sets and the coarse [`BucketPolicy`] levels.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

mod canned;
mod set;

pub use canned::{get_policy, set_policy, BucketPolicy, AWS_RESOURCE_PREFIX};
pub use set::StringSet;

/// Policy language version written by the console.
pub const DEFAULT_VERSION: &str = "2012-10-17";

/// Condition key → values, e.g. `"s3:prefix" → ["photos/"]`.
pub type ConditionKeyMap = BTreeMap<String, StringSet>;

/// Condition operator → keys, e.g. `"StringEquals" → {...}`.
pub type ConditionMap = BTreeMap<String, ConditionKeyMap>;

/// A bucket policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAccessPolicy {
    #[serde(rename = "Version", default)]
    pub version: String,
    #[serde(rename = "Statement", default)]
    pub statements: Vec<Statement>,
}

impl BucketAccessPolicy {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            statements,
        }
    }

    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// A single policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Action", default)]
    pub actions: StringSet,
    #[serde(
        rename = "Condition",
        default,
        skip_serializing_if = "ConditionMap::is_empty"
    )]
    pub conditions: ConditionMap,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Principal", default)]
    pub principal: User,
    #[serde(rename = "Resource", default)]
    pub resources: StringSet,
    #[serde(rename = "Sid", default, skip_serializing_if = "String::is_empty")]
    pub sid: String,
}

impl Statement {
    /// An `Allow` statement granted to every principal.
    pub fn allow_everyone(actions: StringSet, resources: StringSet) -> Self {
        Self {
            actions,
            conditions: ConditionMap::new(),
            effect: Effect::Allow,
            principal: User::everyone(),
            resources,
            sid: String::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: ConditionMap) -> Self {
        self.conditions = conditions;
        self
    }

    /// True for `Allow` statements whose principal includes `"*"`.
    pub fn allows_everyone(&self) -> bool {
        self.effect == Effect::Allow && self.principal.aws.contains("*")
    }
}

/// Statement principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct User {
    #[serde(rename = "AWS", skip_serializing_if = "StringSet::is_empty")]
    pub aws: StringSet,
    #[serde(rename = "CanonicalUser", skip_serializing_if = "StringSet::is_empty")]
    pub canonical_user: StringSet,
}

impl User {
    pub fn everyone() -> Self {
        Self {
            aws: StringSet::from(["*"]),
            canonical_user: StringSet::new(),
        }
    }
}

impl<'de> Deserialize<'de> for User {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Principals {
            #[serde(rename = "AWS", default)]
            aws: StringSet,
            #[serde(rename = "CanonicalUser", default)]
            canonical_user: StringSet,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Wildcard(String),
            Principals(Principals),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Wildcard(value) if value == "*" => Ok(User::everyone()),
            Repr::Wildcard(value) => Err(serde::de::Error::custom(format!(
                "invalid principal `{}`",
                value
            ))),
            Repr::Principals(p) => Ok(User {
                aws: p.aws,
                canonical_user: p.canonical_user,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stored_policy() {
        let document = r#"{
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": {"AWS": ["*"]},
                "Action": "s3:GetObject",
                "Resource": ["arn:aws:s3:::demo/*"]
            }]
        }"#;
        let policy = BucketAccessPolicy::from_json(document).unwrap();
        assert_eq!(policy.statements.len(), 1);
        let statement = &policy.statements[0];
        assert!(statement.allows_everyone());
        assert!(statement.actions.contains("s3:GetObject"));
        assert!(statement.conditions.is_empty());
    }

    #[test]
    fn test_missing_version_still_classifies() {
        let document = r#"{"Statement": [
            {"Effect": "Allow", "Principal": "*",
             "Action": ["s3:GetBucketLocation", "s3:ListBucket"],
             "Resource": "arn:aws:s3:::demo"},
            {"Effect": "Allow", "Principal": "*",
             "Action": "s3:GetObject",
             "Resource": "arn:aws:s3:::demo/*"}
        ]}"#;
        let policy = BucketAccessPolicy::from_json(document).unwrap();
        assert!(policy.version.is_empty());
        assert_eq!(
            get_policy(&policy.statements, "demo", ""),
            BucketPolicy::ReadOnly
        );
    }

    #[test]
    fn test_wildcard_principal_string() {
        let statement: Statement = serde_json::from_str(
            r#"{"Effect": "Allow", "Principal": "*", "Action": [], "Resource": []}"#,
        )
        .unwrap();
        assert_eq!(statement.principal, User::everyone());

        let invalid = serde_json::from_str::<Statement>(
            r#"{"Effect": "Allow", "Principal": "someone", "Action": [], "Resource": []}"#,
        );
        assert!(invalid.is_err());
    }

    #[test]
    fn test_serialize_omits_empty_fields() {
        let policy = BucketAccessPolicy::new(vec![Statement::allow_everyone(
            StringSet::from(["s3:GetBucketLocation"]),
            StringSet::from(["arn:aws:s3:::demo"]),
        )]);
        assert_eq!(
            policy.to_json().unwrap(),
            r#"{"Version":"2012-10-17","Statement":[{"Action":["s3:GetBucketLocation"],"Effect":"Allow","Principal":{"AWS":["*"]},"Resource":["arn:aws:s3:::demo"]}]}"#
        );
    }
}
