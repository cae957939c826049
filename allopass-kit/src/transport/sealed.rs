//! Sealed trait marker for [`Transport`](super::Transport) implementations.
//!
//! Only this crate can implement `Transport`, so every implementation hands
//! back the raw signature header untouched for verification.

pub(crate) mod private {
    /// Sealed trait marker.
    pub trait Sealed {}
}
