//! imgscript core - host operation dispatch and runtime wiring
//!
//! Ties the argument marshaling layer to the item scheduler:
//! - [`Dispatcher`] registers host operations and runs script calls as
//!   tasks on the targeted item
//! - [`RuntimeConfig`] loads scheduler and logging settings from TOML
//! - [`init_tracing`] installs the `tracing` subscriber
//! - [`run_stress`] exercises the scheduler's ordering guarantees
//!
//! # Example
//!
//! ```
//! use imgscript_core::{Dispatcher, RuntimeConfig};
//! use imgscript_core::args::{ArgSpec, ParsedArgs, Value};
//! use imgscript_core::actor::Item;
//!
//! let dispatcher: Dispatcher<String> = Dispatcher::from_config(&RuntimeConfig::default()).unwrap();
//! dispatcher
//!     .define("text", "append", vec![ArgSpec::string("suffix")], |item: &mut Item<String>, args: &ParsedArgs| {
//!         let text = item.get_or_insert_with(String::new);
//!         text.push_str(args.str("suffix").unwrap_or_default());
//!         Ok(Value::from(text.as_str()))
//!     })
//!     .unwrap();
//!
//! let doc = dispatcher.open("doc").unwrap();
//! dispatcher.blocking_call("text", "append", doc, &[Value::from("hello")]).unwrap();
//! let text = dispatcher.blocking_call("text", "append", doc, &[Value::from(" world")]).unwrap();
//! assert_eq!(text, Value::from("hello world"));
//! dispatcher.blocking_shutdown().unwrap();
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod stress;
pub mod telemetry;

pub use config::{LoggingConfig, RuntimeConfig};
pub use dispatch::{Dispatcher, Handler, HostOp, HostResult};
pub use error::{ConfigError, DispatchError, HostError};
pub use stress::{run_stress, StressConfig, StressReport};
pub use telemetry::{env_filter, init_tracing};

/// Re-export of the argument marshaling crate
pub use imgscript_args as args;

/// Re-export of the scheduler crate
pub use imgscript_actor as actor;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for embedding the script runtime
    pub use crate::{DispatchError, Dispatcher, HostError, HostOp, RuntimeConfig};
    pub use imgscript_actor::{Item, ItemId};
    pub use imgscript_args::{ArgSpec, ParsedArgs, Signature, Value};
}
