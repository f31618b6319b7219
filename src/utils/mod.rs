pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{is_data_uri, normalize_url_for_cache, resolve_url, to_data_uri};
