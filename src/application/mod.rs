// Application layer - Planning and store-driving use cases
pub mod allocation_service;
pub mod dashboard_store;
pub mod planner;
