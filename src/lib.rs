#![forbid(unsafe_code)]
#![doc = r#"
Llamagate

Authenticating reverse proxy for an OpenAI-compatible inference server.
Every inbound request is gated behind a bearer-token check and relayed to a
single upstream; chat-completion requests additionally get a narrow payload
rewrite that drops reasoning fields (`thinking` / `reasoning_content`) from
tool-calling assistant messages when they conflict with non-empty `content`,
which certain chat templates refuse to render.

Crate highlights
- `sanitize`: the pure message rewrite, usable as a library function.
- `proxy`: the forwarder; buffered-rewrite for chat completions, streaming
  passthrough for everything else, streaming response relay for both.
- `keys` / `auth`: immutable startup-loaded credential set and the bearer
  check applied to every request.
- `headers`: hop-by-hop stripping and Host rewriting for the upstream leg.

The chat-completion path buffers the full request body in memory so it can be
parsed; all other bodies stream through unbuffered.
"#]

pub mod auth;
pub mod headers;
pub mod keys;
pub mod proxy;
pub mod sanitize;
pub mod util;

pub use crate::keys::{ApiKeys, KeyError};
pub use crate::sanitize::sanitize_messages;
