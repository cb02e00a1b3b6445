use std::sync::Arc;

use crate::services::CourseQueries;

#[derive(Clone)]
pub struct AppState {
    pub queries: Arc<CourseQueries>,
}

impl AppState {
    pub fn new(queries: CourseQueries) -> Self {
        Self {
            queries: Arc::new(queries),
        }
    }
}
