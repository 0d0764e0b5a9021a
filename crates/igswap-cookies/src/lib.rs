//! igswap Cookies
//!
//! The cookie record captured into a session snapshot, and the `CookieJar`
//! seam over the browser's live cookie storage:
//! - `list` every cookie for a site and its subdomains
//! - `set` a cookie with its exact attributes
//! - `remove` a cookie addressed by url and name

mod browser;
mod cookie;
mod error;
mod jar;

pub use browser::{BrowserCookieJar, CookieOp};
pub use cookie::{domain_matches, Cookie, SameSite};
pub use error::CookieError;
pub use jar::{CookieJar, MemoryCookieJar};

pub type Result<T> = std::result::Result<T, CookieError>;
