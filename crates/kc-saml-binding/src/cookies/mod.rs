//! HTTP cookie state carried across the requests of one session.
//!
//! `Set-Cookie` fields from responses are parsed into [`SetCookie`] values,
//! normalized into [`CookieRecord`]s and kept in a [`CookieJar`]. The jar is
//! flattened back into a `Cookie` header for the next request.

mod adapter;
mod jar;
mod record;
mod set_cookie;

pub use adapter::*;
pub use jar::*;
pub use record::*;
pub use set_cookie::*;
