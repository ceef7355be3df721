//! Registered-directory CRUD and static-file serving.
//!
//! Out-of-scope-but-present plumbing: agents can register an extra
//! directory (generated docs, coverage reports) so its contents are
//! reachable over the HTTP server without re-indexing it as source.

use std::path::PathBuf;

use axum::Router;
use tower_http::services::ServeDir;

use crate::models::RegisteredDirectory;

/// Builds a `Router` that serves each registered directory under
/// `/static/{alias}/...`.
pub fn static_router(dirs: &[RegisteredDirectory]) -> Router {
    let mut router = Router::new();
    for dir in dirs {
        let path = PathBuf::from(&dir.path);
        let route = format!("/static/{}", dir.alias);
        router = router.nest_service(&route, ServeDir::new(path));
    }
    router
}
