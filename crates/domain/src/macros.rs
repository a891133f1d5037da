//! Macro for implementing Display and FromStr for wire-name enums
//!
//! Several domain enums (HTTP methods, action kinds) have a fixed textual
//! form. This macro keeps `Display` and `FromStr` in sync with one mapping.
//!
//! # Example
//!
//! ```rust
//! use courier_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Verb {
//!     Fetch,
//!     Store,
//! }
//!
//! impl_wire_name_conversions!(Verb {
//!     Fetch => "fetch",
//!     Store => "store",
//! });
//!
//! assert_eq!(Verb::Fetch.to_string(), "fetch");
//! assert_eq!("STORE".parse::<Verb>(), Ok(Verb::Store));
//! ```

/// Implements `Display`, `FromStr` and `as_str` for an enum from a list of
/// `Variant => "name"` pairs
///
/// Parsing is ASCII case-insensitive; `Display` always emits the mapped name.
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical textual form
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(if s.eq_ignore_ascii_case($str) {
                    return Ok(Self::$variant);
                })+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
