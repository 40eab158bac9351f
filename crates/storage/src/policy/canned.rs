//! Canned bucket policies: derive statement sets from a coarse access level
//! and classify statement sets back into one.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ConditionMap, Statement, StringSet};

pub const AWS_RESOURCE_PREFIX: &str = "arn:aws:s3:::";

const COMMON_BUCKET_ACTIONS: [&str; 1] = ["s3:GetBucketLocation"];
const READ_ONLY_BUCKET_ACTIONS: [&str; 1] = ["s3:ListBucket"];
const WRITE_ONLY_BUCKET_ACTIONS: [&str; 1] = ["s3:ListBucketMultipartUploads"];
const READ_ONLY_OBJECT_ACTIONS: [&str; 1] = ["s3:GetObject"];
const WRITE_ONLY_OBJECT_ACTIONS: [&str; 4] = [
    "s3:AbortMultipartUpload",
    "s3:DeleteObject",
    "s3:ListMultipartUploadParts",
    "s3:PutObject",
];

/// Coarse access level granted to everyone on a bucket (or a prefix of it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketPolicy {
    #[default]
    None,
    #[serde(rename = "readonly")]
    ReadOnly,
    #[serde(rename = "writeonly")]
    WriteOnly,
    #[serde(rename = "readwrite")]
    ReadWrite,
}

impl BucketPolicy {
    fn reads(self) -> bool {
        matches!(self, BucketPolicy::ReadOnly | BucketPolicy::ReadWrite)
    }

    fn writes(self) -> bool {
        matches!(self, BucketPolicy::WriteOnly | BucketPolicy::ReadWrite)
    }
}

impl fmt::Display for BucketPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BucketPolicy::None => "none",
            BucketPolicy::ReadOnly => "readonly",
            BucketPolicy::WriteOnly => "writeonly",
            BucketPolicy::ReadWrite => "readwrite",
        };
        write!(f, "{}", s)
    }
}

fn bucket_resource(bucket: &str) -> String {
    format!("{}{}", AWS_RESOURCE_PREFIX, bucket)
}

fn object_resource(bucket: &str, prefix: &str) -> String {
    format!("{}{}/{}*", AWS_RESOURCE_PREFIX, bucket, prefix)
}

fn read_write_object_actions() -> StringSet {
    StringSet::from(READ_ONLY_OBJECT_ACTIONS).union(&StringSet::from(WRITE_ONLY_OBJECT_ACTIONS))
}

/// Replace the public grants on `bucket`/`prefix` with the canned statements
/// for `policy`.
///
/// Statements that do not grant access to everyone are kept untouched.
pub fn set_policy(
    statements: Vec<Statement>,
    policy: BucketPolicy,
    bucket: &str,
    prefix: &str,
) -> Vec<Statement> {
    let kept = remove_statements(statements, bucket, prefix);
    new_statements(policy, bucket, prefix)
        .into_iter()
        .fold(kept, append_statement)
}

/// Classify the public grants on `bucket`/`prefix` as a canned policy.
///
/// Anything that is not a complete read-only, write-only or read-write grant
/// classifies as [`BucketPolicy::None`].
pub fn get_policy(statements: &[Statement], bucket: &str, prefix: &str) -> BucketPolicy {
    let bucket_resource = bucket_resource(bucket);
    let object_resource = object_resource(bucket, prefix);

    let mut bucket_common = false;
    let mut bucket_read = false;
    let mut bucket_write = false;
    let mut matched_resource = String::new();
    let mut object_read = false;
    let mut object_write = false;

    for statement in statements {
        let matched = if statement.resources.contains(&object_resource) {
            StringSet::from([object_resource.as_str()])
        } else {
            statement
                .resources
                .func_match(resource_match, &object_resource)
        };

        if !matched.is_empty() {
            let (read, write) = object_grants(statement);
            for resource in matched.iter() {
                // the most specific resource pattern wins
                if matched_resource.len() < resource.len() {
                    object_read = read;
                    object_write = write;
                    matched_resource = resource.to_string();
                } else if matched_resource.len() == resource.len() {
                    object_read = object_read || read;
                    object_write = object_write || write;
                    matched_resource = resource.to_string();
                }
            }
        } else if statement.resources.contains(&bucket_resource) {
            let (common, read, write) = bucket_grants(statement, prefix);
            bucket_common = bucket_common || common;
            bucket_read = bucket_read || read;
            bucket_write = bucket_write || write;
        }
    }

    if !bucket_common {
        return BucketPolicy::None;
    }
    if bucket_read && bucket_write && object_read && object_write {
        BucketPolicy::ReadWrite
    } else if bucket_read && object_read {
        BucketPolicy::ReadOnly
    } else if bucket_write && object_write {
        BucketPolicy::WriteOnly
    } else {
        BucketPolicy::None
    }
}

fn object_grants(statement: &Statement) -> (bool, bool) {
    if !statement.allows_everyone() || !statement.conditions.is_empty() {
        return (false, false);
    }
    (
        statement
            .actions
            .is_superset(&StringSet::from(READ_ONLY_OBJECT_ACTIONS)),
        statement
            .actions
            .is_superset(&StringSet::from(WRITE_ONLY_OBJECT_ACTIONS)),
    )
}

fn bucket_grants(statement: &Statement, prefix: &str) -> (bool, bool, bool) {
    if !statement.allows_everyone() {
        return (false, false, false);
    }
    let unconditional = statement.conditions.is_empty();
    let actions = &statement.actions;

    let common = unconditional && actions.is_superset(&StringSet::from(COMMON_BUCKET_ACTIONS));
    let write = unconditional && actions.is_superset(&StringSet::from(WRITE_ONLY_BUCKET_ACTIONS));

    let read = actions.is_superset(&StringSet::from(READ_ONLY_BUCKET_ACTIONS))
        && if unconditional {
            true
        } else if prefix.is_empty() {
            false
        } else if let Some(equals) = statement.conditions.get("StringEquals") {
            equals
                .get("s3:prefix")
                .map(|values| values.contains(prefix))
                .unwrap_or(false)
        } else if let Some(not_equals) = statement.conditions.get("StringNotEquals") {
            not_equals
                .get("s3:prefix")
                .map(|values| !values.contains(prefix))
                .unwrap_or(false)
        } else {
            false
        };

    (common, read, write)
}

/// Wildcard match of a resource `pattern` (with `*`) against `resource`.
fn resource_match(pattern: &str, resource: &str) -> bool {
    if pattern.is_empty() {
        return resource.is_empty();
    }
    if pattern == "*" {
        return true;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return resource == pattern;
    }
    let trailing_glob = pattern.ends_with('*');
    let end = parts.len() - 1;

    if !resource.starts_with(parts[0]) {
        return false;
    }
    let mut rest = resource;
    for part in &parts[1..end] {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    trailing_glob || rest.ends_with(parts[end])
}

/// Drop the public grants this policy level manages from `statements`.
fn remove_statements(statements: Vec<Statement>, bucket: &str, prefix: &str) -> Vec<Statement> {
    let bucket_resource = bucket_resource(bucket);
    let object_resource = object_resource(bucket, prefix);

    statements
        .into_iter()
        .filter_map(|mut statement| {
            if !statement.allows_everyone() {
                return Some(statement);
            }
            statement.resources.remove(&object_resource);
            if prefix.is_empty() || conditions_name_prefix(&statement.conditions, prefix) {
                statement.resources.remove(&bucket_resource);
            }
            (!statement.resources.is_empty()).then_some(statement)
        })
        .collect()
}

fn conditions_name_prefix(conditions: &ConditionMap, prefix: &str) -> bool {
    conditions.values().any(|keys| {
        keys.get("s3:prefix")
            .map(|values| values.contains(prefix))
            .unwrap_or(false)
    })
}

fn new_statements(policy: BucketPolicy, bucket: &str, prefix: &str) -> Vec<Statement> {
    if policy == BucketPolicy::None || bucket.is_empty() {
        return Vec::new();
    }
    let mut statements = new_bucket_statements(policy, bucket, prefix);
    statements.push(new_object_statement(policy, bucket, prefix));
    statements
}

fn new_bucket_statements(policy: BucketPolicy, bucket: &str, prefix: &str) -> Vec<Statement> {
    let resource = StringSet::from([bucket_resource(bucket).as_str()]);
    let mut statements = vec![Statement::allow_everyone(
        StringSet::from(COMMON_BUCKET_ACTIONS),
        resource.clone(),
    )];

    if policy.reads() {
        let mut statement =
            Statement::allow_everyone(StringSet::from(READ_ONLY_BUCKET_ACTIONS), resource.clone());
        if !prefix.is_empty() {
            let mut keys = super::ConditionKeyMap::new();
            keys.insert("s3:prefix".to_string(), StringSet::from([prefix]));
            let mut conditions = ConditionMap::new();
            conditions.insert("StringEquals".to_string(), keys);
            statement = statement.with_conditions(conditions);
        }
        statements.push(statement);
    }

    if policy.writes() {
        statements.push(Statement::allow_everyone(
            StringSet::from(WRITE_ONLY_BUCKET_ACTIONS),
            resource,
        ));
    }

    statements
}

fn new_object_statement(policy: BucketPolicy, bucket: &str, prefix: &str) -> Statement {
    let actions = match policy {
        BucketPolicy::ReadOnly => StringSet::from(READ_ONLY_OBJECT_ACTIONS),
        BucketPolicy::WriteOnly => StringSet::from(WRITE_ONLY_OBJECT_ACTIONS),
        BucketPolicy::ReadWrite => read_write_object_actions(),
        BucketPolicy::None => StringSet::new(),
    };
    Statement::allow_everyone(
        actions,
        StringSet::from([object_resource(bucket, prefix).as_str()]),
    )
}

/// Merge `statement` into an existing one when they differ only in actions or
/// only in resources; otherwise append it.
fn append_statement(mut statements: Vec<Statement>, statement: Statement) -> Vec<Statement> {
    for existing in statements.iter_mut() {
        let same_grantee = existing.effect == statement.effect
            && existing.principal.aws == statement.principal.aws;

        if same_grantee && existing.conditions == statement.conditions {
            if existing.actions == statement.actions {
                existing.resources = existing.resources.union(&statement.resources);
                return statements;
            }
            if existing.resources == statement.resources {
                existing.actions = existing.actions.union(&statement.actions);
                return statements;
            }
        }

        if same_grantee
            && existing.resources.is_superset(&statement.resources)
            && existing.actions.is_superset(&statement.actions)
        {
            if existing.conditions == statement.conditions {
                return statements;
            }
            if !existing.conditions.is_empty()
                && !statement.conditions.is_empty()
                && existing.resources == statement.resources
            {
                existing.conditions = merge_conditions(&existing.conditions, &statement.conditions);
                return statements;
            }
        }
    }

    if !(statement.actions.is_empty() && statement.resources.is_empty()) {
        statements.push(statement);
    }
    statements
}

fn merge_conditions(a: &ConditionMap, b: &ConditionMap) -> ConditionMap {
    let mut merged = a.clone();
    for (operator, keys) in b {
        let entry = merged.entry(operator.clone()).or_default();
        for (key, values) in keys {
            let current = entry.entry(key.clone()).or_default();
            *current = current.union(values);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{BucketAccessPolicy, Effect, User};

    #[test]
    fn test_read_write_statements() {
        let statements = set_policy(Vec::new(), BucketPolicy::ReadWrite, "demo", "");
        assert_eq!(statements.len(), 2);

        let bucket = &statements[0];
        assert_eq!(bucket.resources, StringSet::from(["arn:aws:s3:::demo"]));
        assert_eq!(
            bucket.actions,
            StringSet::from([
                "s3:GetBucketLocation",
                "s3:ListBucket",
                "s3:ListBucketMultipartUploads"
            ])
        );

        let object = &statements[1];
        assert_eq!(object.resources, StringSet::from(["arn:aws:s3:::demo/*"]));
        assert_eq!(object.actions, read_write_object_actions());
        assert!(object.allows_everyone());
    }

    #[test]
    fn test_none_and_empty_bucket_produce_nothing() {
        assert!(set_policy(Vec::new(), BucketPolicy::None, "demo", "").is_empty());
        assert!(set_policy(Vec::new(), BucketPolicy::ReadWrite, "", "").is_empty());
    }

    #[test]
    fn test_get_policy_classifies_canned_sets() {
        for policy in [
            BucketPolicy::ReadOnly,
            BucketPolicy::WriteOnly,
            BucketPolicy::ReadWrite,
        ] {
            let statements = set_policy(Vec::new(), policy, "demo", "");
            assert_eq!(get_policy(&statements, "demo", ""), policy);
        }
        assert_eq!(get_policy(&[], "demo", ""), BucketPolicy::None);
    }

    #[test]
    fn test_get_policy_for_other_bucket_is_none() {
        let statements = set_policy(Vec::new(), BucketPolicy::ReadWrite, "demo", "");
        assert_eq!(get_policy(&statements, "other", ""), BucketPolicy::None);
    }

    #[test]
    fn test_set_policy_none_clears_public_grants() {
        let public = set_policy(Vec::new(), BucketPolicy::ReadWrite, "demo", "");
        assert!(set_policy(public, BucketPolicy::None, "demo", "").is_empty());
    }

    #[test]
    fn test_set_policy_keeps_private_statements() {
        let private = Statement {
            actions: StringSet::from(["s3:GetObject"]),
            conditions: ConditionMap::new(),
            effect: Effect::Allow,
            principal: User {
                aws: StringSet::from(["arn:aws:iam::123456789012:user/alice"]),
                canonical_user: StringSet::new(),
            },
            resources: StringSet::from(["arn:aws:s3:::demo/*"]),
            sid: "alice".to_string(),
        };
        let statements = set_policy(vec![private.clone()], BucketPolicy::None, "demo", "");
        assert_eq!(statements, vec![private]);
    }

    #[test]
    fn test_set_policy_replaces_previous_level() {
        let read_only = set_policy(Vec::new(), BucketPolicy::ReadOnly, "demo", "");
        let read_write = set_policy(read_only, BucketPolicy::ReadWrite, "demo", "");
        assert_eq!(get_policy(&read_write, "demo", ""), BucketPolicy::ReadWrite);
        assert_eq!(
            read_write,
            set_policy(Vec::new(), BucketPolicy::ReadWrite, "demo", "")
        );
    }

    #[test]
    fn test_prefix_read_only_uses_condition() {
        let statements = set_policy(Vec::new(), BucketPolicy::ReadOnly, "demo", "photos/");
        assert_eq!(get_policy(&statements, "demo", "photos/"), BucketPolicy::ReadOnly);

        let conditioned = statements
            .iter()
            .find(|s| !s.conditions.is_empty())
            .expect("prefix read grant is conditioned");
        assert!(conditioned.actions.contains("s3:ListBucket"));
    }

    #[test]
    fn test_wildcard_resource_counts_as_object_grant() {
        let document = r#"{
            "Version": "2012-10-17",
            "Statement": [
                {"Effect": "Allow", "Principal": {"AWS": ["*"]},
                 "Action": ["s3:GetBucketLocation", "s3:ListBucket", "s3:ListBucketMultipartUploads"],
                 "Resource": ["arn:aws:s3:::demo"]},
                {"Effect": "Allow", "Principal": {"AWS": ["*"]},
                 "Action": ["s3:AbortMultipartUpload", "s3:DeleteObject", "s3:GetObject", "s3:ListMultipartUploadParts", "s3:PutObject"],
                 "Resource": ["arn:aws:s3:::dem*"]}
            ]
        }"#;
        let policy = BucketAccessPolicy::from_json(document).unwrap();
        assert_eq!(
            get_policy(&policy.statements, "demo", ""),
            BucketPolicy::ReadWrite
        );
    }

    #[test]
    fn test_deny_statements_never_grant() {
        let mut statements = set_policy(Vec::new(), BucketPolicy::ReadWrite, "demo", "");
        for statement in statements.iter_mut() {
            statement.effect = Effect::Deny;
        }
        assert_eq!(get_policy(&statements, "demo", ""), BucketPolicy::None);
    }

    #[test]
    fn test_resource_match() {
        assert!(resource_match("*", "arn:aws:s3:::demo/*"));
        assert!(resource_match("arn:aws:s3:::demo/*", "arn:aws:s3:::demo/*"));
        assert!(resource_match("arn:aws:s3:::de*", "arn:aws:s3:::demo/*"));
        assert!(!resource_match("arn:aws:s3:::other/*", "arn:aws:s3:::demo/*"));
        assert!(!resource_match("", "arn:aws:s3:::demo/*"));
        assert!(resource_match("arn:aws:s3:::demo", "arn:aws:s3:::demo"));
    }
}
