pub mod chat;
pub mod greeting;
pub mod http;
pub mod notify;
pub mod scorer;
pub mod zhipin;

pub use chat::ChatClient;
pub use greeting::LlmGreeter;
pub use http::{HttpClient, HttpResponse};
pub use notify::WebhookNotifier;
pub use scorer::OpenAiScorer;
pub use zhipin::ZhipinPlatform;
