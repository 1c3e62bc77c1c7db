//! # Filter Module
//!
//! Filters validate and convert the raw text of a single parametric path
//! segment. A pattern such as `/blog/cat:id uint` binds the `uint` filter to
//! the `id` parameter; when a request for `/blog/cat3282` arrives the filter
//! receives `"3282"` and either converts it (here to the number `3282`) or
//! rejects it, in which case the matcher backtracks to the next candidate
//! branch.
//!
//! Filters are created at registration time by a [`FilterRegistry`], which maps
//! a class name to a [`FilterBuilder`]. Unknown class names and builders that
//! reject their arguments fail route registration immediately.
//!
//! ## Built-in classes
//!
//! | Class    | Arguments       | Converted value                          |
//! |----------|-----------------|------------------------------------------|
//! | `string` | `[min [max]]`   | the text, length-checked                 |
//! | `alpha`  |                 | ASCII letters only                       |
//! | `alnum`  |                 | ASCII letters and digits only            |
//! | `hex`    |                 | ASCII hex digits only                    |
//! | `uint`   | `[8|16|32|64]`  | unsigned number                          |
//! | `int`    | `[8|16|32|64]`  | signed number                            |
//! | `regex`  | `<source>`      | first capture group, or the whole text   |
//!
//! `/:name | ^[a-z]+$` is shorthand for the `regex` class.

mod builtin;
mod core;

pub use self::core::{BoundFilter, Filter, FilterBuilder, FilterFn, FilterRegistry};
pub use builtin::REGEX_CLASS;
