//! Typed governance models
//!
//! All models serialize to camelCase JSON. Closed value sets are Rust enums
//! stored as snake_case text.

/// Declare a closed string-valued enum stored as text.
///
/// Generates `as_str`, `ALL`, `Display`, serde (de)serialization using the
/// given text, and `FromStr` failing with [`crate::Error::InvalidInput`].
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Every value, in declaration order
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Stored text representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> $crate::Result<Self> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err($crate::Error::InvalidInput(format!(
                        "Invalid {} '{}'. Must be one of: {}",
                        stringify!($name),
                        other,
                        [$( $text ),+].join(", ")
                    ))),
                }
            }
        }
    };
}

pub mod adm;
pub mod artifacts;
pub mod capabilities;
pub mod conflicts;
pub mod links;
pub mod parking;
pub mod pcf;
pub mod principles;

pub use adm::*;
pub use artifacts::*;
pub use capabilities::*;
pub use conflicts::*;
pub use links::*;
pub use parking::*;
pub use pcf::*;
pub use principles::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_string_enum_text_forms_agree() {
        for status in LifecycleStatus::ALL {
            assert_eq!(LifecycleStatus::from_str(status.as_str()).unwrap(), *status);
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_unknown_value_lists_allowed_values() {
        let err = LifecycleStatus::from_str("deleted").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("deleted"));
        assert!(message.contains("active, archived, superseded, parking_lot"));
    }
}
