//! SONiC syncd apply-view convergence engine.
//!
//! Given the view the hardware currently holds and the view the control
//! plane just requested, computes and executes the minimal sequence of
//! create, remove and set operations that takes the device from one to the
//! other, reusing device objects wherever their attributes allow.
//!
//! - [`view`]: the object graph of one view and its operation log
//! - [`finder`]: best current candidate for a temporary object
//! - [`comparison`]: the recursive view transition
//! - [`executor`]: replay of the operation log against the device
//! - [`apply`]: the two-stage apply driver
//! - [`snapshot`]: persisted views and their offline comparison

pub mod apply;
pub mod comparison;
pub mod config;
pub mod error;
pub mod executor;
pub mod finder;
pub mod ref_counter;
pub mod snapshot;
pub mod switch;
pub mod view;

pub use apply::{apply_view, apply_view_locked, ApplyReport};
pub use comparison::ComparisonLogic;
pub use config::{ApplyViewConfig, BreakConfig, EngineConfig, ExecutionConfig, RemovalPolicy};
pub use error::{Result, SyncdError};
pub use executor::{check_consistency, AsicExecutor};
pub use snapshot::{compare_snapshots, Snapshot};
pub use switch::SwitchContext;
pub use view::{AsicOperation, AsicView, ObjectStatus, OpKind, TableDump};
