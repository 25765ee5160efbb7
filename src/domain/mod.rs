// Domain layer - Dashboard, widget and metric models plus pure planning rules
pub mod capacity;
pub mod classifier;
pub mod dashboard;
pub mod error;
pub mod event;
pub mod metric;
pub mod naming;
pub mod widget;
