extern crate self as rowbind;

mod mapper;
mod model;

pub use mapper::*;
pub use model::*;
pub use rowbind_core::*;
pub use rowbind_macros::*;

/// Builds a `Vec<Value>` of query arguments.
///
/// ```
/// use rowbind::args;
/// let args = args![1i64, vec![1i32, 2, 3], "active"];
/// assert_eq!(args.len(), 3);
/// assert!(args[1].is_list());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}
