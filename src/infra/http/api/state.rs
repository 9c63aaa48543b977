use std::sync::Arc;

use crate::application::resources::ResourceService;

#[derive(Clone)]
pub struct ApiState {
    pub resources: Arc<ResourceService>,
}

impl ApiState {
    pub fn new(resources: ResourceService) -> Self {
        Self {
            resources: Arc::new(resources),
        }
    }
}
