//! Memoized read-only projections over the store.
//!
//! Each projection caches its last result keyed by the revision of the slice
//! it reads: the per-session revision for message/task views, the projects
//! revision for project views. A change to an unrelated slice leaves the
//! cached value (and its `Arc` identity) untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::project::Project;
use crate::session::{Message, Pagination, Session, Task};
use crate::store::SessionStore;

/// Upper bound on the recent-projects projection.
pub const RECENT_PROJECTS_LIMIT: usize = 10;

#[derive(Default)]
struct Caches {
    messages: HashMap<String, (u64, Arc<Vec<Message>>)>,
    tasks: HashMap<String, (u64, Arc<Vec<Task>>)>,
    recent_projects: Option<(u64, Arc<Vec<Project>>)>,
    project_paths: Option<(u64, Arc<Vec<String>>)>,
}

/// Memoized selectors over a [`SessionStore`].
///
/// Cheap to clone; clones share the cache. Selector results are immutable
/// snapshots: callers never observe later store mutations through them.
#[derive(Clone)]
pub struct Selectors {
    store: SessionStore,
    caches: Arc<Mutex<Caches>>,
}

impl Selectors {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            caches: Arc::new(Mutex::new(Caches::default())),
        }
    }

    /// The currently selected session, if any.
    pub async fn active_session(&self) -> Option<Session> {
        self.store.read().await.active_session().cloned()
    }

    /// A session by id.
    pub async fn session(&self, id: &str) -> Option<Session> {
        self.store.read().await.session(id).cloned()
    }

    /// The pagination cursor for a session.
    pub async fn pagination_for(&self, id: &str) -> Option<Pagination> {
        self.store
            .read()
            .await
            .session(id)
            .map(|s| s.pagination.clone())
    }

    /// The ordered message log for a session. Empty for unknown ids.
    pub async fn messages_for(&self, id: &str) -> Arc<Vec<Message>> {
        let state = self.store.read().await;
        let Some(session) = state.session(id) else {
            self.caches.lock().unwrap().messages.remove(id);
            return Arc::new(Vec::new());
        };

        let mut caches = self.caches.lock().unwrap();
        if let Some((revision, cached)) = caches.messages.get(id) {
            if *revision == session.revision {
                return cached.clone();
            }
        }
        let fresh = Arc::new(session.messages.clone());
        caches
            .messages
            .insert(id.to_string(), (session.revision, fresh.clone()));
        fresh
    }

    /// The task records for a session, ordered by task id for determinism.
    pub async fn tasks_for(&self, id: &str) -> Arc<Vec<Task>> {
        let state = self.store.read().await;
        let Some(session) = state.session(id) else {
            self.caches.lock().unwrap().tasks.remove(id);
            return Arc::new(Vec::new());
        };

        let mut caches = self.caches.lock().unwrap();
        if let Some((revision, cached)) = caches.tasks.get(id) {
            if *revision == session.revision {
                return cached.clone();
            }
        }
        let mut tasks: Vec<Task> = session.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        let fresh = Arc::new(tasks);
        caches
            .tasks
            .insert(id.to_string(), (session.revision, fresh.clone()));
        fresh
    }

    /// Projects ordered by `last_opened` descending, bounded by
    /// [`RECENT_PROJECTS_LIMIT`].
    pub async fn recent_projects(&self) -> Arc<Vec<Project>> {
        let state = self.store.read().await;
        let revision = state.projects_revision();

        let mut caches = self.caches.lock().unwrap();
        if let Some((cached_revision, cached)) = &caches.recent_projects {
            if *cached_revision == revision {
                return cached.clone();
            }
        }
        let mut projects = state.projects().to_vec();
        projects.sort_by(|a, b| b.last_opened.cmp(&a.last_opened));
        projects.truncate(RECENT_PROJECTS_LIMIT);
        let fresh = Arc::new(projects);
        caches.recent_projects = Some((revision, fresh.clone()));
        fresh
    }

    /// The set of known project paths.
    pub async fn available_project_paths(&self) -> Arc<Vec<String>> {
        let state = self.store.read().await;
        let revision = state.projects_revision();

        let mut caches = self.caches.lock().unwrap();
        if let Some((cached_revision, cached)) = &caches.project_paths {
            if *cached_revision == revision {
                return cached.clone();
            }
        }
        let fresh = Arc::new(
            state
                .projects()
                .iter()
                .map(|p| p.path.clone())
                .collect::<Vec<_>>(),
        );
        caches.project_paths = Some((revision, fresh.clone()));
        fresh
    }
}
