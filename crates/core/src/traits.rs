//! Bounds shared by every layer
//!
//! Keys are opaque hashable tokens and values are opaque serializable
//! payloads. Both must cross thread boundaries, and both must round-trip
//! through a snapshot codec.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::Hash;

/// Anything usable as a store key
pub trait StoreKey: Eq + Hash + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> StoreKey for T where T: Eq + Hash + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{}

/// Anything usable as a store value
pub trait StoreValue: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> StoreValue for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}
