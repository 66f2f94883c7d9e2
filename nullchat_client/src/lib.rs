// nullchat_client — polling client library for the nullchat relay.
//
// Frontends own a `ChatClient`, drive it from their own loop, and get
// `ServerEvent`s back; no thread is spawned and no callback is taken.

pub mod error;
pub mod session;

pub use error::ClientError;
pub use session::ChatClient;
