//! Type-erased argument destinations, actions and a GNU-style parser.
//!
//! Arguments write straight into caller-owned variables. The engine never
//! learns their concrete types: each destination type registers its
//! capabilities once ([`ops::ArgType`]) and everything else goes through the
//! resulting [`ops::Operations`] table.
//!
//! ```
//! use argot::{ActionKind, ArgumentBuilder, ArgumentParser, ParseOutcome};
//!
//! let mut verbose = 0_u8;
//! let mut name = String::new();
//! {
//!     let mut parser = ArgumentParser::new("greet");
//!     parser.add_argument(
//!         ArgumentBuilder::new(["-v", "--verbose"])
//!             .dest(&mut verbose)
//!             .action(ActionKind::Count),
//!     );
//!     parser.add_argument(ArgumentBuilder::new(["name"]).dest(&mut name));
//!     assert_eq!(
//!         parser.parse_args(["-vv", "world"]),
//!         Ok(ParseOutcome::Parsed(Vec::new()))
//!     );
//! }
//! assert_eq!((verbose, name.as_str()), (2, "world"));
//! ```

pub mod any;
pub mod argument;
pub mod backend;
pub mod dest;
pub mod error;
pub mod help;
pub mod holder;
pub mod info;
pub mod mode;
pub mod ops;
pub mod parser;
pub mod subcommand;
pub mod traits;

pub use any::AnyValue;
pub use argument::{Argument, ArgumentBuilder};
pub use dest::OpaqueDestination;
pub use error::{ConversionError, ParseError, ParseResult};
pub use holder::{ArgumentHolder, ArgumentId, GroupId};
pub use info::{ActionInfo, ActionKind, CallbackClient, DestInfo, NamesInfo, NumArgsInfo, TypeInfo};
pub use mode::OpenMode;
pub use ops::{ArgType, Capabilities, OpKind, Operations, operations_of};
pub use parser::{ArgumentParser, ParseOutcome};
pub use subcommand::{SubCommand, SubCommandGroup, SubCommandHolder};
