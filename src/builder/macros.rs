//! Macros for declaring state and event identifiers.

/// Declare a fieldless enum usable as a state or event identifier.
///
/// The generated enum is `#[repr(usize)]` with variants numbered from zero
/// and gains:
/// - `COUNT`, `NAMES` and `ALL` associated constants
/// - `index()` and `name()`
/// - `From` conversions into [`StateId`](crate::core::StateId) and
///   [`EventId`](crate::core::EventId)
///
/// # Example
///
/// ```
/// use jumptable_fsm::fsm_ids;
/// use jumptable_fsm::core::StateId;
///
/// fsm_ids! {
///     pub enum LinkState {
///         Idle,
///         Connecting,
///         Up,
///     }
/// }
///
/// assert_eq!(LinkState::COUNT, 3);
/// assert_eq!(LinkState::NAMES, &["Idle", "Connecting", "Up"]);
/// assert_eq!(StateId::from(LinkState::Up), StateId(2));
/// ```
#[macro_export]
macro_rules! fsm_ids {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(usize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),+
        }

        impl $name {
            pub const NAMES: &'static [&'static str] = &[$(stringify!($variant)),+];
            pub const COUNT: usize = Self::NAMES.len();
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub const fn index(self) -> usize {
                self as usize
            }

            pub const fn name(self) -> &'static str {
                Self::NAMES[self as usize]
            }

            /// Variant for a raw index, if in range.
            pub fn from_index(index: usize) -> ::core::option::Option<Self> {
                Self::ALL.get(index).copied()
            }
        }

        impl ::core::convert::From<$name> for $crate::core::StateId {
            fn from(value: $name) -> Self {
                $crate::core::StateId::new(value.index())
            }
        }

        impl ::core::convert::From<$name> for $crate::core::EventId {
            fn from(value: $name) -> Self {
                $crate::core::EventId::new(value.index())
            }
        }
    };
}
