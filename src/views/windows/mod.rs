//! 최상위 창 뷰

pub mod error_view;
pub mod root_view;

pub use error_view::ErrorView;
pub use root_view::RootView;
