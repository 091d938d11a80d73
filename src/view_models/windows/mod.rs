//! 창 단위 뷰모델
//!
//! | 뷰모델 | 수명 | 뷰 |
//! |--------|------|----|
//! | [`RootViewModel`] | Singleton | `RootView` |
//! | [`ErrorViewModel`] | Transient | `ErrorView` |

pub mod error_view_model;
pub mod root_view_model;

pub use error_view_model::ErrorViewModel;
pub use root_view_model::RootViewModel;
