// ABOUTME: In-memory registry and image builder for lifecycle tests.
// ABOUTME: Both fakes share one world and record every call in order.

#![allow(dead_code)]

use async_trait::async_trait;
use ecrbuildpush::fingerprint::Fingerprint;
use ecrbuildpush::reconcile::{DesiredImageSpec, ReconcileContext, Reconciler};
use ecrbuildpush::registry::{
    ImageManifest, RegistryAuth, RegistryAuthenticator, RegistryError, RegistryInspector,
    RegistryMutator, TagMutability,
};
use ecrbuildpush::runtime::{BuilderError, ImageBuilder, PushReport};
use ecrbuildpush::types::{ImageName, ImageRef, ImageTag, Region, RepositoryName};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const ACCOUNT_ID: &str = "acct";
pub const REGION: &str = "eu-central-1";
pub const LAYERS_PER_IMAGE: usize = 2;

/// A call made through one of the capability traits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ToolchainRunning,
    RepositoryExists(String),
    RepositoryMutability(String),
    TagExists(String, String),
    GetManifest(String, String),
    PutManifest(String, String),
    DeleteTag(String, String),
    AccountId,
    Authorization,
    Build(String),
    Tag(String, String),
    Push(String),
}

impl Call {
    /// Calls that change the registry or the local image store.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::Build(_) | Call::Tag(..) | Call::Push(_) | Call::PutManifest(..) | Call::DeleteTag(..)
        )
    }
}

#[derive(Debug, Clone)]
struct Repository {
    mutability: TagMutability,
    tags: BTreeMap<String, String>,
}

#[derive(Default)]
struct WorldState {
    repositories: HashMap<String, Repository>,
    local_images: HashMap<String, String>,
    calls: Vec<Call>,
    regions: Vec<String>,
    vanishing: HashSet<String>,
    toolchain_down: bool,
    auth_denied: bool,
    build_fails: bool,
    push_fails_after: Option<usize>,
    registry_delay: Option<Duration>,
}

/// Shared state behind the fake registry and the fake builder.
#[derive(Clone, Default)]
pub struct World {
    inner: Arc<Mutex<WorldState>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(self, name: &str, mutability: TagMutability) -> Self {
        self.inner.lock().repositories.insert(
            name.to_string(),
            Repository {
                mutability,
                tags: BTreeMap::new(),
            },
        );
        self
    }

    pub fn with_tag(self, repository: &str, tag: &str, manifest: &str) -> Self {
        self.inner
            .lock()
            .repositories
            .get_mut(repository)
            .expect("repository must be added first")
            .tags
            .insert(tag.to_string(), manifest.to_string());
        self
    }

    pub fn manifest(&self, repository: &str, tag: &str) -> Option<String> {
        self.inner
            .lock()
            .repositories
            .get(repository)
            .and_then(|r| r.tags.get(tag).cloned())
    }

    pub fn tags(&self, repository: &str) -> Vec<String> {
        self.inner
            .lock()
            .repositories
            .get(repository)
            .map(|r| r.tags.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn remove_repository(&self, repository: &str) {
        self.inner.lock().repositories.remove(repository);
    }

    pub fn remove_tag(&self, repository: &str, tag: &str) {
        if let Some(r) = self.inner.lock().repositories.get_mut(repository) {
            r.tags.remove(tag);
        }
    }

    pub fn stop_toolchain(&self) {
        self.inner.lock().toolchain_down = true;
    }

    pub fn deny_auth(&self) {
        self.inner.lock().auth_denied = true;
    }

    pub fn fail_builds(&self) {
        self.inner.lock().build_fails = true;
    }

    pub fn allow_builds(&self) {
        self.inner.lock().build_fails = false;
    }

    /// Delete `repository` right after the next existence check reports it.
    pub fn vanish_after_check(&self, repository: &str) {
        self.inner.lock().vanishing.insert(repository.to_string());
    }

    pub fn fail_push_after(&self, layers: usize) {
        self.inner.lock().push_fails_after = Some(layers);
    }

    pub fn slow_registry(&self, delay: Duration) {
        self.inner.lock().registry_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        let mut state = self.inner.lock();
        state.calls.clear();
        state.regions.clear();
    }

    /// Region of every registry call, in order.
    pub fn regions(&self) -> Vec<String> {
        self.inner.lock().regions.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn reconciler(&self) -> Reconciler<FakeRegistry, FakeBuilder> {
        Reconciler::new(
            FakeRegistry {
                world: self.clone(),
            },
            FakeBuilder {
                world: self.clone(),
            },
        )
    }

    fn record(&self, call: Call) {
        self.inner.lock().calls.push(call);
    }

    fn record_in(&self, region: &Region, call: Call) {
        let mut state = self.inner.lock();
        state.regions.push(region.to_string());
        state.calls.push(call);
    }

    async fn registry_latency(&self) {
        let delay = self.inner.lock().registry_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Manifest the fake builder produces for a Dockerfile.
pub fn manifest_for(dockerfile: &str) -> String {
    format!(
        r#"{{"schemaVersion":2,"config":"{}"}}"#,
        Fingerprint::of_bytes(dockerfile.as_bytes())
    )
}

pub struct FakeRegistry {
    world: World,
}

#[async_trait]
impl RegistryInspector for FakeRegistry {
    async fn repository_exists(
        &self,
        region: &Region,
        repository: &RepositoryName,
    ) -> Result<bool, RegistryError> {
        self.world.registry_latency().await;
        self.world
            .record_in(region, Call::RepositoryExists(repository.to_string()));
        let mut state = self.world.inner.lock();
        let exists = state.repositories.contains_key(repository.as_str());
        if state.vanishing.remove(repository.as_str()) {
            state.repositories.remove(repository.as_str());
        }
        Ok(exists)
    }

    async fn repository_mutability(
        &self,
        region: &Region,
        repository: &RepositoryName,
    ) -> Result<TagMutability, RegistryError> {
        self.world
            .record_in(region, Call::RepositoryMutability(repository.to_string()));
        self.world
            .inner
            .lock()
            .repositories
            .get(repository.as_str())
            .map(|r| r.mutability)
            .ok_or_else(|| RegistryError::RepositoryNotFound(repository.to_string()))
    }

    async fn tag_exists(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<bool, RegistryError> {
        self.world
            .record_in(region, Call::TagExists(repository.to_string(), tag.to_string()));
        let state = self.world.inner.lock();
        let repo = state
            .repositories
            .get(repository.as_str())
            .ok_or_else(|| RegistryError::RepositoryNotFound(repository.to_string()))?;
        Ok(repo.tags.contains_key(tag.as_str()))
    }

    async fn get_manifest(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<ImageManifest, RegistryError> {
        self.world
            .record_in(region, Call::GetManifest(repository.to_string(), tag.to_string()));
        let state = self.world.inner.lock();
        let repo = state
            .repositories
            .get(repository.as_str())
            .ok_or_else(|| RegistryError::RepositoryNotFound(repository.to_string()))?;
        repo.tags
            .get(tag.as_str())
            .map(ImageManifest::new)
            .ok_or_else(|| RegistryError::ImageNotFound(format!("{}:{}", repository, tag)))
    }
}

#[async_trait]
impl RegistryMutator for FakeRegistry {
    async fn put_manifest(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
        manifest: &ImageManifest,
    ) -> Result<(), RegistryError> {
        self.world
            .record_in(region, Call::PutManifest(repository.to_string(), tag.to_string()));
        let mut state = self.world.inner.lock();
        let repo = state
            .repositories
            .get_mut(repository.as_str())
            .ok_or_else(|| RegistryError::RepositoryNotFound(repository.to_string()))?;

        match repo.tags.get(tag.as_str()) {
            Some(existing) if existing == manifest.as_str() => Err(
                RegistryError::ImageAlreadyExists(format!("{}:{}", repository, tag)),
            ),
            Some(_) if repo.mutability.is_immutable() => Err(RegistryError::TagImmutable(
                format!("{}:{}", repository, tag),
            )),
            _ => {
                repo.tags
                    .insert(tag.to_string(), manifest.as_str().to_string());
                Ok(())
            }
        }
    }

    async fn delete_tag(
        &self,
        region: &Region,
        repository: &RepositoryName,
        tag: &ImageTag,
    ) -> Result<(), RegistryError> {
        self.world
            .record_in(region, Call::DeleteTag(repository.to_string(), tag.to_string()));
        let mut state = self.world.inner.lock();
        let repo = state
            .repositories
            .get_mut(repository.as_str())
            .ok_or_else(|| RegistryError::RepositoryNotFound(repository.to_string()))?;
        repo.tags
            .remove(tag.as_str())
            .map(|_| ())
            .ok_or_else(|| RegistryError::ImageNotFound(format!("{}:{}", repository, tag)))
    }
}

#[async_trait]
impl RegistryAuthenticator for FakeRegistry {
    async fn account_id(&self, region: &Region) -> Result<String, RegistryError> {
        self.world.record_in(region, Call::AccountId);
        Ok(ACCOUNT_ID.to_string())
    }

    async fn authorization(&self, region: &Region) -> Result<RegistryAuth, RegistryError> {
        self.world.record_in(region, Call::Authorization);
        if self.world.inner.lock().auth_denied {
            return Err(RegistryError::Unauthorized("token expired".to_string()));
        }
        Ok(RegistryAuth {
            username: "AWS".to_string(),
            password: "secret".to_string(),
            server: Some(format!("{}.dkr.ecr.{}.amazonaws.com", ACCOUNT_ID, region)),
        })
    }
}

pub struct FakeBuilder {
    world: World,
}

#[async_trait]
impl ImageBuilder for FakeBuilder {
    async fn toolchain_running(&self) -> Result<(), BuilderError> {
        self.world.record(Call::ToolchainRunning);
        if self.world.inner.lock().toolchain_down {
            return Err(BuilderError::Unavailable("docker not running".to_string()));
        }
        Ok(())
    }

    async fn build_image(&self, image: &ImageRef, context: &Path) -> Result<(), BuilderError> {
        self.world.record(Call::Build(image.to_string()));
        if self.world.inner.lock().build_fails {
            return Err(BuilderError::BuildFailed("RUN exited with 1".to_string()));
        }
        let dockerfile = std::fs::read_to_string(context.join("Dockerfile"))
            .map_err(|e| BuilderError::Context(e.to_string()))?;
        self.world
            .inner
            .lock()
            .local_images
            .insert(image.to_string(), manifest_for(&dockerfile));
        Ok(())
    }

    async fn tag_image(&self, source: &ImageRef, target: &ImageRef) -> Result<(), BuilderError> {
        self.world
            .record(Call::Tag(source.to_string(), target.to_string()));
        let mut state = self.world.inner.lock();
        let manifest = state
            .local_images
            .get(&source.to_string())
            .cloned()
            .ok_or_else(|| BuilderError::TagFailed(format!("no such image: {}", source)))?;
        state.local_images.insert(target.to_string(), manifest);
        Ok(())
    }

    async fn push_image(
        &self,
        image: &ImageRef,
        _auth: &RegistryAuth,
    ) -> Result<PushReport, BuilderError> {
        self.world.record(Call::Push(image.to_string()));
        let mut state = self.world.inner.lock();

        if let Some(layers_pushed) = state.push_fails_after {
            return Err(BuilderError::PushFailed {
                reference: image.to_string(),
                message: "connection reset".to_string(),
                layers_pushed,
            });
        }

        let manifest = state
            .local_images
            .get(&image.to_string())
            .cloned()
            .ok_or_else(|| BuilderError::PushFailed {
                reference: image.to_string(),
                message: "image not tagged".to_string(),
                layers_pushed: 0,
            })?;
        let repo = state
            .repositories
            .get_mut(image.name())
            .ok_or_else(|| BuilderError::PushFailed {
                reference: image.to_string(),
                message: "repository does not exist".to_string(),
                layers_pushed: 0,
            })?;
        if repo.mutability.is_immutable() && repo.tags.contains_key(image.tag()) {
            return Err(BuilderError::PushFailed {
                reference: image.to_string(),
                message: "tag invalid: immutable tag already exists".to_string(),
                layers_pushed: LAYERS_PER_IMAGE,
            });
        }
        repo.tags.insert(image.tag().to_string(), manifest);

        Ok(PushReport {
            layers_pushed: LAYERS_PER_IMAGE,
            layers_reused: 0,
        })
    }
}

/// Build context containing only a Dockerfile.
pub fn build_context(dockerfile: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_dockerfile(dir.path(), dockerfile);
    dir
}

pub fn write_dockerfile(dir: &Path, dockerfile: &str) {
    std::fs::write(dir.join("Dockerfile"), dockerfile).unwrap();
}

pub fn spec(context: &Path, repository: &str, tag: &str) -> DesiredImageSpec {
    DesiredImageSpec {
        repository: RepositoryName::new(repository).unwrap(),
        build_context: context.to_path_buf(),
        image_name: ImageName::new("myapp").unwrap(),
        image_tag: ImageTag::new(tag).unwrap(),
    }
}

pub fn ctx() -> ReconcileContext {
    ReconcileContext::new(Region::new(REGION).unwrap())
}

pub fn remote(repository: &str, tag: &str) -> String {
    format!("{}.dkr.ecr.{}.amazonaws.com/{}:{}", ACCOUNT_ID, REGION, repository, tag)
}
