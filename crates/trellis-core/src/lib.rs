//! # Trellis Core
//!
//! The service layer of the Trellis composition framework.
//!
//! This crate provides the building blocks plugins use to share behaviour
//! without compile-time coupling:
//!
//! - **Service references**: typed, `Copy` handles naming a service
//!   ([`ServiceRef`])
//! - **Service factories**: construction functions plus their declared
//!   dependencies ([`ServiceFactory`])
//! - **The registry**: depth-first, memoized singleton resolution with cycle
//!   detection ([`ServiceRegistry`])
//! - **Dependency bundles**: the resolved services handed to a factory or an
//!   initialization callback ([`ServiceBundle`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trellis_core::{ServiceFactory, ServiceRef, ServiceRegistry};
//!
//! struct Greeter {
//!     prefix: String,
//! }
//!
//! const GREETER: ServiceRef<Greeter> = ServiceRef::new("demo.greeter");
//!
//! # async fn example() -> Result<(), trellis_core::ServiceError> {
//! let mut registry = ServiceRegistry::new();
//! registry.define(
//!     GREETER,
//!     ServiceFactory::new(|_deps| async {
//!         Ok(Arc::new(Greeter { prefix: "hello".into() }))
//!     }),
//! )?;
//!
//! let greeter = registry.resolve(GREETER).await?;
//! assert_eq!(greeter.prefix, "hello");
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod error;
pub mod factory;
pub mod reference;
pub mod registry;

pub use bundle::ServiceBundle;
pub use error::{BoxError, ServiceError, ServiceResult};
pub use factory::{ServiceArc, ServiceFactory};
pub use reference::ServiceRef;
pub use registry::ServiceRegistry;
