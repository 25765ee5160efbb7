// Application state for HTTP handlers
use crate::application::allocation_service::AllocationService;

#[derive(Clone)]
pub struct AppState {
    pub allocation_service: AllocationService,
}
