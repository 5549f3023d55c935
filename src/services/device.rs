// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device binding policy.
//!
//! A pure decision over the stored binding and the device id the client
//! presented. The same table applies at login and on every authenticated
//! request; the policy never mutates state.
//!
//! | bound      | presented  | decision                     |
//! |------------|------------|------------------------------|
//! | none       | any        | allow                        |
//! | `D`        | absent     | `DeviceVerificationRequired` |
//! | `D`        | `D`        | allow                        |
//! | `D`        | other      | `DeviceConflict`             |

use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::id_utils::random_hex;

/// Longest device id accepted from a client.
pub const MAX_DEVICE_ID_LEN: usize = 128;

const GENERATED_DEVICE_ID_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceDecision {
    Allow,
    VerificationRequired,
    Conflict,
}

impl DeviceDecision {
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            DeviceDecision::Allow => Ok(()),
            DeviceDecision::VerificationRequired => Err(AppError::DeviceVerificationRequired),
            DeviceDecision::Conflict => Err(AppError::DeviceConflict),
        }
    }
}

/// Evaluate the binding table.
pub fn evaluate(bound: Option<&str>, presented: Option<&str>) -> DeviceDecision {
    match (bound, presented) {
        (None, _) => DeviceDecision::Allow,
        (Some(_), None) => DeviceDecision::VerificationRequired,
        (Some(bound), Some(presented)) => {
            if bool::from(bound.as_bytes().ct_eq(presented.as_bytes())) {
                DeviceDecision::Allow
            } else {
                DeviceDecision::Conflict
            }
        }
    }
}

/// Trim a client-supplied device id; blank counts as absent.
pub fn normalize(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|id| !id.is_empty())
}

/// Fresh opaque device id for clients that did not send one.
pub fn generate_device_id() -> Result<String, AppError> {
    Ok(random_hex(GENERATED_DEVICE_ID_BYTES)?)
}
