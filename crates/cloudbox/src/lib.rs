#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use cloudbox_linalg as linalg;

#[doc(inline)]
pub use cloudbox_3d as k3d;
