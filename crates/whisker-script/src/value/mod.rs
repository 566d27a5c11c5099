mod convert;
mod table;
mod value;

pub use convert::{canonical_number, compare, equals, parse_lua_number, to_number, to_string};
pub use table::Table;
pub use value::{BuiltinFn, FunctionObject, Value};
