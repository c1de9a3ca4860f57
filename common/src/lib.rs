mod container;
mod error;
mod functor;
mod scope;
mod symbol;
mod value;

pub use container::{Ancestor, Instance, Module, Type};
pub use error::{EvalError, EvalErrorKind, EvalResult};
pub use functor::{Clause, Dispatch, Functor, NativeFn, UserClause};
pub use scope::{Scope, SymbolTable};
pub use symbol::Symbol;
pub use value::{BuiltinType, ListData, MapData, Value};
