//! The autotype security check.
//!
//! A type-discriminator string found in data must never force construction
//! of an arbitrary type. The check runs against the explicit allow/deny
//! policy before any binder is consulted, even when a binder for the named
//! type exists and would happily build it.

use crate::options::{AutoTypePolicy, DecodeOptions};

/// Outcome of checking one discriminator value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AutoTypeDecision {
    /// The name passed the policy; a binder for it may be used.
    Permit,
    /// The name was rejected (or autotype is ignored); store the
    /// discriminator verbatim as an ordinary field.
    StoreVerbatim,
    /// The name was rejected under a strict policy; fail the parse.
    Reject,
}

pub(crate) fn check_auto_type(options: &DecodeOptions, name: &str) -> AutoTypeDecision {
    if options.ignore_auto_type {
        return AutoTypeDecision::StoreVerbatim;
    }
    decide(&options.auto_type, name)
}

fn decide(policy: &AutoTypePolicy, name: &str) -> AutoTypeDecision {
    if policy.permits(name) {
        AutoTypeDecision::Permit
    } else if policy.strict {
        tracing::warn!(type_name = name, "autotype rejected by strict policy");
        AutoTypeDecision::Reject
    } else {
        tracing::debug!(type_name = name, "autotype not on allow list, storing verbatim");
        AutoTypeDecision::StoreVerbatim
    }
}
