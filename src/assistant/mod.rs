//! AI query handling: the service boundary, retry/backoff, local quick
//! commands and the per-request dispatcher.

pub mod dispatcher;
pub mod gemini;
pub mod local;
pub mod retry;
pub mod types;

pub use dispatcher::QueryDispatcher;
pub use gemini::GeminiClient;
pub use local::LocalCommand;
pub use retry::{RetryMachine, RetryPolicy, RetryState, Sleeper, TokioSleeper};
pub use types::{
    AiResponse, AiService, NO_RESPONSE, QueryError, QueryPayload, QueryRequest, QueryResult,
};
