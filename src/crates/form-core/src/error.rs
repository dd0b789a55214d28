//! Error types for schema authoring and parameter mutation
//!
//! Two families of failure exist and they are handled very differently:
//!
//! ```text
//! FormError                 - schema-authoring mistakes, returned as Err
//! ├── UnknownFieldClass
//! ├── UnknownCalculableClass
//! ├── IncompatibleRule      - see RuleIncompatibility
//! ├── DuplicateClass
//! ├── InvalidClassName
//! ├── InvalidMutationKey
//! ├── DuplicateActionType
//! ├── UnknownMutation
//! ├── InvalidActionType
//! ├── Serialization
//! └── Config
//!
//! MutationError             - a single mutation leaf refused its input;
//!                             reducers log it and keep the previous state
//! ```
//!
//! Reducers never return errors. Anything reachable from end-user
//! interaction degrades to a no-op plus a `tracing::warn!`. Only the
//! registry and builder layers return [`FormError`], and only for
//! conditions a schema author can fix before runtime.
//!
//! # Examples
//!
//! ```rust
//! use form_core::error::{FormError, RuleIncompatibility};
//!
//! fn describe(err: &FormError) -> String {
//!     match err {
//!         FormError::IncompatibleRule(RuleIncompatibility::NotOverridable { path, .. }) => {
//!             format!("cannot attach a rule to {}", path)
//!         }
//!         other => other.to_string(),
//!     }
//! }
//! ```

use thiserror::Error;

/// Convenience result type using [`FormError`]
pub type Result<T> = std::result::Result<T, FormError>;

/// Errors raised while defining a schema or building a form programmatically
#[derive(Error, Debug)]
pub enum FormError {
    /// Referenced field class was never registered
    #[error("FieldClass \"{0}\" does not exist")]
    UnknownFieldClass(String),

    /// Referenced calculable class was never registered
    #[error("CalculableClass \"{0}\" does not exist")]
    UnknownCalculableClass(String),

    /// A rule cannot be attached to the requested parameter path
    #[error("Incompatible rule: {0}")]
    IncompatibleRule(#[from] RuleIncompatibility),

    /// The same class name was registered twice in one namespace
    #[error("{namespace} class \"{name}\" is already registered")]
    DuplicateClass {
        /// `field` or `calculable`
        namespace: String,
        /// Class name
        name: String,
    },

    /// Class names take part in action types and must not contain `/` or `@`
    #[error("Invalid class name \"{0}\"")]
    InvalidClassName(String),

    /// Mutation tree keys take part in action types and must not contain `/`
    #[error("Invalid mutation key \"{key}\" in class \"{class}\"")]
    InvalidMutationKey {
        /// Class owning the mutation tree
        class: String,
        /// Offending key
        key: String,
    },

    /// Two leaves synthesized the same action type
    #[error("Duplicate action type \"{0}\"")]
    DuplicateActionType(String),

    /// A fluent call named a mutation that the class does not declare
    #[error("Class \"{class}\" has no mutation at \"{path}\"")]
    UnknownMutation {
        /// Class name
        class: String,
        /// Dotted mutation path
        path: String,
    },

    /// Action type string does not follow `@namespace/Class/path`
    #[error("Invalid action type \"{0}\"")]
    InvalidActionType(String),

    /// Payload or descriptor could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration text could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Reasons a rule attachment is refused by `validate_rule_compatible`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleIncompatibility {
    /// Host field class is unknown
    #[error("FieldClass \"{0}\" does not exist")]
    UnknownFieldClass(String),

    /// Calculable class is unknown
    #[error("CalculableClass \"{0}\" does not exist")]
    UnknownCalculableClass(String),

    /// Path is not declared overridable by the field class
    #[error("\"{path}\" is not overridable on \"{field_class}\"")]
    NotOverridable {
        /// Host field class
        field_class: String,
        /// Requested path, relative to the field
        path: String,
    },

    /// None of the accepted types matches the calculable's result type
    #[error("\"{path}\" expects {expected} but calculable \"{calculable}\" returns {actual}")]
    TypeMismatch {
        /// Requested path
        path: String,
        /// Accepted types, comma separated
        expected: String,
        /// Calculable class
        calculable: String,
        /// Calculable result type
        actual: String,
    },
}

/// Failure of one mutation leaf
///
/// Never escapes a reducer: the reducer logs it and returns its input.
#[derive(Error, Debug)]
pub enum MutationError {
    /// Positional argument could not be decoded into the expected type
    #[error("argument {index} is invalid: {source}")]
    InvalidArgument {
        /// Position in the payload
        index: usize,
        /// Decoding failure
        #[source]
        source: serde_json::Error,
    },

    /// Parameter structure does not match the mutation's expected shape
    #[error("params do not match the expected shape: {0}")]
    InvalidParams(#[source] serde_json::Error),

    /// Index into a list does not exist
    #[error("{what} index {index} does not exist")]
    IndexOutOfRange {
        /// What was indexed (choice, image, condition group...)
        what: &'static str,
        /// Requested index
        index: usize,
    },

    /// The mutation declined the change for a domain reason
    #[error("{0}")]
    Rejected(String),
}

impl FormError {
    /// Error for a class name that clashes with an existing registration
    pub fn duplicate_class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateClass {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}
