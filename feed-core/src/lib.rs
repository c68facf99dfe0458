pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod post;
pub mod render;
pub mod sanitize;
pub mod state;

pub use config::{AppConfig, FeedConfig, RenderConfig, ThemeConfig, UiConfig, DEFAULT_FEED_URL};
pub use error::{ConfigError, FetchError};
pub use filter::{filter_and_sort, FilterMode};
pub use loader::{spawn_load, FeedLoader, LoadEvent, LoadHandle};
pub use post::PostRecord;
pub use render::{format_age, render_post, truncate, Marker, PostCard, SpanStyle, TextBlock, TextSpan};
pub use sanitize::{sanitize_markup, MarkupSanitizer, SafeElement, SafeFragment, SafeNode, SafeTag};
pub use state::{FeedState, LoadStatus};
