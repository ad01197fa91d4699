//! Selectors - memoized projections of the store state
//!
//! A selector caches the last value it produced together with the
//! [`Version`] of the state it was computed from. Asking again for the same
//! version returns the cached value without running the projection.
//!
//! Selectors compose: a derived selector evaluates its upstream selectors with
//! the same version first, so in a diamond-shaped graph every shared ancestor
//! runs at most once per version.
//!
//! Cached values also record the override generation of the selector and its
//! ancestors. Pinning or unpinning an ancestor's value invalidates what was
//! derived from it, even at an unchanged version.
//!
//! ```
//! use statehouse::{Selector, Version};
//!
//! struct AppState { counter: i64, step: i64 }
//!
//! let counter = Selector::new(|s: &AppState| s.counter);
//! let step = Selector::new(|s: &AppState| s.step);
//! let next = Selector::compose2(&counter, &step, |c, s| c + s);
//!
//! let state = AppState { counter: 8, step: 2 };
//! assert_eq!(next.map(&state, Version::next()), 10);
//! ```

use crate::state::Version;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

type Projection<S, V> = dyn Fn(&S, Version) -> V + Send + Sync;

/// What a cached value is valid for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheToken {
    /// Computed for exactly this state version
    Version(Version),
    /// Overridden value, valid for every version until cleared
    Pinned,
}

pub(crate) struct Cached<V> {
    pub(crate) token: CacheToken,
    pub(crate) stamp: u64,
    pub(crate) value: V,
}

pub(crate) struct SelectorInner<S, V> {
    projection: Box<Projection<S, V>>,
    pub(crate) cache: RwLock<Option<Cached<V>>>,
    /// Bumped each time the value is pinned or unpinned
    pub(crate) overrides: AtomicU64,
    upstream: Vec<Arc<dyn OverrideStamp>>,
}

/// Override generations summed over a selector and its ancestors
///
/// Generations only grow, so any pin or unpin upstream changes the sum.
pub(crate) trait OverrideStamp: Send + Sync {
    fn override_stamp(&self) -> u64;
}

impl<S, V> OverrideStamp for SelectorInner<S, V>
where
    V: Send + Sync,
{
    fn override_stamp(&self) -> u64 {
        self.upstream
            .iter()
            .map(|upstream| upstream.override_stamp())
            .fold(self.overrides.load(Ordering::Acquire), u64::wrapping_add)
    }
}

/// Memoized pure projection `S -> V`
///
/// Clones share one cache, so a selector can be defined once and handed to
/// every place that reads it.
pub struct Selector<S, V> {
    pub(crate) inner: Arc<SelectorInner<S, V>>,
}

impl<S, V> Selector<S, V>
where
    S: 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Selector over the whole state
    pub fn new(projection: impl Fn(&S) -> V + Send + Sync + 'static) -> Self {
        Self::from_projection(Vec::new(), move |state, _| projection(state))
    }

    fn from_projection(
        upstream: Vec<Arc<dyn OverrideStamp>>,
        projection: impl Fn(&S, Version) -> V + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(SelectorInner {
                projection: Box::new(projection),
                cache: RwLock::new(None),
                overrides: AtomicU64::new(0),
                upstream,
            }),
        }
    }

    fn as_upstream(&self) -> Arc<dyn OverrideStamp> {
        Arc::clone(&self.inner) as Arc<dyn OverrideStamp>
    }

    /// Value of this selector for `state` at `version`
    ///
    /// Returns the cached value when it was computed for `version` (or has
    /// been pinned); otherwise runs the projection and caches the result.
    pub fn map(&self, state: &S, version: Version) -> V {
        let stamp = self.inner.override_stamp();
        if let Some(value) = self.cached(version, stamp) {
            return value;
        }

        let value = (self.inner.projection)(state, version);

        // Concurrent misses for the same version compute the same value, so
        // the last writer wins. A pinned value is never replaced here.
        let mut cache = self
            .inner
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !matches!(cache.as_ref(), Some(c) if c.token == CacheToken::Pinned) {
            *cache = Some(Cached {
                token: CacheToken::Version(version),
                stamp,
                value: value.clone(),
            });
        }
        value
    }

    fn cached(&self, version: Version, stamp: u64) -> Option<V> {
        let cache = self
            .inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        cache
            .as_ref()
            .filter(|c| {
                c.token == CacheToken::Pinned
                    || (c.token == CacheToken::Version(version) && c.stamp == stamp)
            })
            .map(|c| c.value.clone())
    }

    /// Version the cached value was computed for, if any
    pub fn cached_version(&self) -> Option<Version> {
        let cache = self
            .inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match cache.as_ref()?.token {
            CacheToken::Version(version) => Some(version),
            CacheToken::Pinned => None,
        }
    }

    /// Selector over any number of upstream selectors of the same value type
    ///
    /// The projector receives the upstream values in the order given.
    pub fn combine<U>(
        upstream: Vec<Selector<S, U>>,
        projector: impl Fn(&[U]) -> V + Send + Sync + 'static,
    ) -> Self
    where
        U: Clone + Send + Sync + 'static,
    {
        let stamps = upstream.iter().map(Selector::as_upstream).collect();
        Self::from_projection(stamps, move |state, version| {
            let values: Vec<U> = upstream.iter().map(|s| s.map(state, version)).collect();
            projector(&values)
        })
    }
}

macro_rules! compose {
    ($(#[$doc:meta])* $name:ident => $($upstream:ident: $ty:ident),+) => {
        $(#[$doc])*
        pub fn $name<$($ty),+>(
            $($upstream: &Selector<S, $ty>,)+
            projector: impl Fn($(&$ty),+) -> V + Send + Sync + 'static,
        ) -> Self
        where
            $($ty: Clone + Send + Sync + 'static,)+
        {
            let stamps = vec![$($upstream.as_upstream()),+];
            $(let $upstream = $upstream.clone();)+
            Self::from_projection(stamps, move |state, version| {
                $(let $upstream = $upstream.map(state, version);)+
                projector($(&$upstream),+)
            })
        }
    };
}

impl<S, V> Selector<S, V>
where
    S: 'static,
    V: Clone + Send + Sync + 'static,
{
    compose!(
        /// Selector derived from one upstream selector
        compose1 => a: A
    );
    compose!(
        /// Selector derived from two upstream selectors
        compose2 => a: A, b: B
    );
    compose!(compose3 => a: A, b: B, c: C);
    compose!(compose4 => a: A, b: B, c: C, d: D);
    compose!(compose5 => a: A, b: B, c: C, d: D, e: E);
}

impl<S, V> Clone for Selector<S, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, V> fmt::Debug for Selector<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self
            .inner
            .cache
            .read()
            .ok()
            .and_then(|cache| cache.as_ref().map(|c| c.token));
        f.debug_struct("Selector").field("cached", &token).finish()
    }
}
