//! Deferred values.
//!
//! A [`Deferred`] is a value that is not known while descriptors are composed: a stack
//! output, a configured secret, or anything derived from them. Composers transform
//! deferred values with [`Deferred::map`], [`Deferred::try_map`], [`Deferred::zip`] and
//! [`Deferred::all`]; only the resolution side (the plan, driven by a [`Resolve`]
//! implementation) ever extracts a value.
//!
//! Transformations must be pure. They may run more than once and in any order.

use std::fmt;
use std::sync::Arc;

use crate::error::{ResolveError, Result};

/// Source of the values deferred composition depends on.
///
/// Implemented by the engine side of a pass (see [`crate::core::stack::StackOutputs`]).
pub trait Resolve {
    /// Look up an output of the prerequisite stack.
    fn stack_output(&self, key: &str) -> Option<serde_json::Value>;

    /// Look up a configured secret. Absence is not an error.
    fn secret(&self, key: &str) -> Option<String>;
}

type Thunk<T> = dyn Fn(&dyn Resolve) -> Result<T> + Send + Sync;

/// A pending value resolved by a [`Resolve`] implementation.
///
/// Cloning is cheap and shares the underlying computation. The `secret` mark is
/// sticky: anything derived from a secret value is itself secret.
pub struct Deferred<T> {
    thunk: Arc<Thunk<T>>,
    secret: bool,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            thunk: Arc::clone(&self.thunk),
            secret: self.secret,
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Deferred<T> {
    fn from_fn<F>(secret: bool, f: F) -> Self
    where
        F: Fn(&dyn Resolve) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            thunk: Arc::new(f),
            secret,
        }
    }

    /// A value that is already known.
    pub fn known(value: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Self::from_fn(false, move |_| Ok(value.clone()))
    }

    /// Transform the value once it resolves.
    pub fn map<U, F>(&self, f: F) -> Deferred<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let inner = self.clone();
        Deferred::from_fn(self.secret, move |r| inner.resolve(r).map(&f))
    }

    /// Transform the value with a fallible function.
    ///
    /// The error surfaces when the value is resolved, not when the transformation is
    /// declared.
    pub fn try_map<U, F>(&self, f: F) -> Deferred<U>
    where
        U: 'static,
        F: Fn(T) -> Result<U> + Send + Sync + 'static,
    {
        let inner = self.clone();
        Deferred::from_fn(self.secret, move |r| inner.resolve(r).and_then(&f))
    }

    /// Combine with another deferred value.
    pub fn zip<U: 'static>(&self, other: &Deferred<U>) -> Deferred<(T, U)> {
        let (left, right) = (self.clone(), other.clone());
        Deferred::from_fn(self.secret || other.secret, move |r| {
            Ok((left.resolve(r)?, right.resolve(r)?))
        })
    }

    /// Collect deferred values into one, preserving order.
    pub fn all(items: impl IntoIterator<Item = Deferred<T>>) -> Deferred<Vec<T>> {
        let items: Vec<Deferred<T>> = items.into_iter().collect();
        let secret = items.iter().any(|d| d.secret);
        Deferred::from_fn(secret, move |r| items.iter().map(|d| d.resolve(r)).collect())
    }

    /// Mark the value as secret.
    pub fn into_secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Clear the secret mark.
    ///
    /// Only for values that carry nothing of the secret they were derived from, such
    /// as whether it was set at all.
    pub fn into_public(mut self) -> Self {
        self.secret = false;
        self
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }

    /// Resolve the value.
    ///
    /// Only the resolution side of a pass calls this; composers never do.
    pub fn resolve(&self, resolver: &dyn Resolve) -> Result<T> {
        (self.thunk)(resolver)
    }
}

impl Deferred<String> {
    /// An output of the prerequisite stack. Must resolve to a string.
    pub fn stack_output(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::from_fn(false, move |r| match r.stack_output(&key) {
            Some(serde_json::Value::String(value)) => Ok(value),
            Some(_) => Err(ResolveError::NotAString(key.clone()).into()),
            None => Err(ResolveError::MissingStackOutput(key.clone()).into()),
        })
    }
}

impl Deferred<Option<String>> {
    /// An optional configured secret.
    pub fn secret(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::from_fn(true, move |r| Ok(r.secret(&key)))
    }
}
