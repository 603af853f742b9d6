// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Access enforcement for shared ledger resources.
//!
//! A budget is accessible to its owner and to every user in its shared set.
//! Authorization is always re-derived from the stored record at request time;
//! sharing membership can change between requests, so no cached claim is
//! trusted.

use super::{StoreError, StoreResult};

/// Required access level for an operation.
///
/// Read and write currently use the same predicate (there is no read-only
/// sharing tier), but call sites state their intent through the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Read,
    Write,
}

/// Trait for resources owned by one user and shared with others.
pub trait SharedResource {
    /// Get the owner's user id.
    fn owner_user_id(&self) -> &str;

    /// Get the co-owner user ids.
    fn shared_user_ids(&self) -> &[String];

    /// Resource name used in error reporting.
    fn resource_name(&self) -> &'static str;
}

/// Trait for enforcing access on storage operations.
pub trait AccessEnforcer {
    /// Verify the user may access this resource at the given level.
    ///
    /// # Errors
    /// Returns `StoreError::PermissionDenied` if the user is neither the
    /// owner nor a shared user.
    fn verify_access(&self, user_id: &str, level: AccessLevel) -> StoreResult<()>;

    /// Verify the user is the owner. Sharing management is owner-only.
    fn verify_owner(&self, user_id: &str) -> StoreResult<()>;
}

impl<T: SharedResource> AccessEnforcer for T {
    fn verify_access(&self, user_id: &str, level: AccessLevel) -> StoreResult<()> {
        match level {
            // No read-only tier: both levels share one predicate.
            AccessLevel::Read | AccessLevel::Write => {
                if self.owner_user_id() == user_id
                    || self.shared_user_ids().iter().any(|id| id == user_id)
                {
                    Ok(())
                } else {
                    Err(StoreError::PermissionDenied {
                        user_id: user_id.to_string(),
                        resource: self.resource_name().to_string(),
                    })
                }
            }
        }
    }

    fn verify_owner(&self, user_id: &str) -> StoreResult<()> {
        if self.owner_user_id() == user_id {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                user_id: user_id.to_string(),
                resource: self.resource_name().to_string(),
            })
        }
    }
}
