// ABOUTME: Publish pipeline state markers for the type state pattern.
// ABOUTME: Each marker carries the data that exists once its step has succeeded.

use crate::registry::RegistryAuth;
use crate::runtime::PushReport;
use crate::types::ImageRef;

/// Fingerprint computed, nothing built yet.
/// Available actions: `build()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Pending;

/// Local image built.
/// Available actions: `tag()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Built;

/// Local image tagged with its registry reference.
/// Available actions: `authenticate()`
#[derive(Debug, Clone)]
pub struct Tagged {
    pub(crate) remote: ImageRef,
}

/// Push credentials decoded.
/// Available actions: `release_immutable_tag()`, `push()`
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub(crate) remote: ImageRef,
    pub(crate) auth: RegistryAuth,
}

/// Image pushed.
/// Available actions: `resolve()`
#[derive(Debug, Clone)]
pub struct Pushed {
    pub(crate) remote: ImageRef,
    pub(crate) report: PushReport,
}
