//! Internal helpers for generating the accessors of [`Value`].
//!
//! [`Value`]: crate::Value

/// Generate an `as_TYPE` method returning a copy of the payload of a variant.
macro_rules! define_as (
    ($fn_name:ident, $t:ident, $variant:ident) => (
define_as_pattern!($fn_name, $t => Self::$variant(v) => Some(v));
    );
);

/// Generate an `as_TYPE` method returning a reference to the payload of a variant.
macro_rules! define_as_ref (
    ($fn_name:ident, $t:ty, $variant:ident) => (
define_as_ref_pattern!($fn_name, $t => Self::$variant(v) => Some(v));
    );
);

/// Generate an `as_TYPE_mut` method returning a mutable reference to the payload of a variant.
macro_rules! define_as_ref_mut (
    ($fn_name:ident, $t:ty, $variant:ident) => (
/// Get a mutable reference to the payload of `self` if it is a `$t`.
///
/// # Return
/// If `self` is of the matching variant, return `Some` with a mutable reference to the payload.
/// Otherwise, return `None`.
#[must_use]
pub fn $fn_name(&mut self) -> Option<$t> {
    match self {
        Self::$variant(v) => Some(v),
        _ => None
    }
}
    );
);

/// Generate an `into_TYPE` method consuming `self` and returning the payload of a variant.
macro_rules! define_into (
    ($fn_name:ident, $t:ty, $variant:ident) => (
define_into_pattern!($fn_name, $t => Self::$variant(v) => Some(v));
    );
);

/// Generate an `is_TYPE` method testing the variant of `self`.
macro_rules! define_is (
    ($fn_name:ident, $variant:pat) => (
/// Check whether the value is of the given variant.
///
/// # Return
/// If `self` matches `$variant`, return `true`. Otherwise, return `false`.
#[must_use]
pub fn $fn_name(&self) -> bool {
    matches!(self, $variant)
}
    );
);

/// Generate an `as_TYPE` method from a match arm.
///
/// Use this when the payload needs converting. If it can be copied as is, use [`define_as`].
macro_rules! define_as_pattern (
    ($fn_name:ident, $t:ty => $($variant:tt)+ ) => (
/// Get a copy of the payload of `self` if it is a `$t`.
///
/// # Return
/// If `self` is of the matching variant, return `Some` with a copy of the payload. Otherwise,
/// return `None`.
#[must_use]
pub fn $fn_name(&self) -> Option<$t> {
    match *self {
        $($variant)+,
        _ => None
    }
}
    );
);

/// Generate an `as_TYPE` method returning a reference, from a match arm.
macro_rules! define_as_ref_pattern (
    ($fn_name:ident, $t:ty => $($variant:tt)+) => (
/// Get a reference to the payload of `self` if it is a `$t`.
///
/// # Return
/// If `self` is of the matching variant, return `Some` with a reference to the payload.
/// Otherwise, return `None`.
#[must_use]
pub fn $fn_name(&self) -> Option<$t> {
    match self {
        $($variant)+,
        _ => None
    }
}
    );
);

/// Generate an `into_TYPE` method, from a match arm.
macro_rules! define_into_pattern (
    ($fn_name:ident, $t:ty => $($variant:tt)+) => (
/// Get the payload of `self` if it is a `$t`, consuming `self`.
///
/// # Return
/// If `self` is of the matching variant, return `Some` with the payload. Otherwise, return
/// `None`.
#[must_use]
pub fn $fn_name(self) -> Option<$t> {
    match self {
        $($variant)+,
        _ => None
    }
}
    );
);
