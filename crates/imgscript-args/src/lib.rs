//! imgscript args - script/host argument marshaling
//!
//! Values crossing from the embedded interpreter into host operations are
//! untyped. This crate turns them into strongly-typed host values:
//! - [`ArgSpec`] declares the expected shape of each argument
//! - [`ArgParser`] / [`parse_args`] validate and convert positional values
//! - [`Signature`] checks a host operation's declaration once at registration
//! - [`map_schema`] fills option objects from defaults without validation
//!
//! # Example
//!
//! ```
//! use imgscript_args::{ArgSpec, Signature, Value};
//!
//! let resize = Signature::new(
//!     "image",
//!     "resize",
//!     vec![
//!         ArgSpec::int("width"),
//!         ArgSpec::int("height"),
//!         ArgSpec::table("opts", vec![ArgSpec::string("filter")]).optional(),
//!     ],
//! )
//! .unwrap();
//!
//! let args = resize.parse(&[Value::from(640), Value::from(480)]).unwrap();
//! assert_eq!(args.int("width").unwrap(), 640);
//! assert_eq!(args.table("opts").unwrap().str("filter").unwrap(), "");
//! ```

#![warn(unreachable_pub)]

pub mod arg_spec;
pub mod error;
pub mod parsed;
pub mod parser;
pub mod schema;
pub mod signature;
pub mod value;

pub use arg_spec::{ArgKind, ArgSpec};
pub use error::{ArgError, SignatureError};
pub use parsed::{ArgValue, ParsedArgs};
pub use parser::{parse_args, ArgParser};
pub use schema::{map_schema, map_schema_value};
pub use signature::Signature;
pub use value::{Table, Value};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for declaring and parsing host operation arguments
    pub use crate::{ArgError, ArgSpec, ArgValue, ParsedArgs, Signature, Value};
}
