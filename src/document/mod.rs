//! Membership document parsing.
//!
//! Documents follow the `conference-info` format of the conference event
//! package:
//!
//! ```xml
//! <conference-info entity="sips:conf233@example.com" state="full" version="1">
//!   <users>
//!     <user entity="sip:bob@example.com" state="full">
//!       <roles><entry>admin</entry></roles>
//!     </user>
//!   </users>
//! </conference-info>
//! ```
//!
//! Parsing is a pure function. It keeps no state between calls, so every
//! session can call it directly.

mod parser;

pub use parser::{parse, parse_str};
