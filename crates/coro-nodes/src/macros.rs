//! Typed node handles.

/// Byte-wise string equality usable in constant evaluation.
pub(crate) const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Declare a typed handle over `Node<Kind>` with one getter/setter pair per
/// parameter slot.
///
/// Each entry names the slot index, the parameter name and the accessor
/// identifiers. Slot indices are checked against the kind's parameter table
/// at compile time.
macro_rules! node_type {
    (
        $(#[$meta:meta])*
        $name:ident($kind:ident, $params:ident) {
            $( [$slot:literal] $param:literal => $get:ident, $set:ident; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name(coro_core::Node<$kind>);

        $(
            const _: () = assert!(
                $crate::macros::str_eq($params[$slot].name, $param),
                concat!("slot ", stringify!($slot), " is not `", $param, "`"),
            );
        )*

        impl $name {
            /// Start a builder with every argument at its default.
            pub fn builder() -> coro_core::NodeBuilder<$kind> {
                coro_core::NodeBuilder::new($kind)
            }

            /// The untyped node.
            pub fn into_node(self) -> coro_core::Node<$kind> {
                self.0
            }

            $(
                #[doc = concat!("Current `", $param, "` value.")]
                pub fn $get(&self) -> &coro_core::ExpandableValue {
                    &self.0.values()[$slot]
                }

                #[doc = concat!("Replace `", $param, "` on every voice.")]
                pub fn $set(
                    &mut self,
                    value: impl Into<coro_core::ExpandableValue>,
                ) -> coro_core::Result<coro_core::SetOutcome> {
                    self.0.set_at($slot, value.into())
                }
            )*
        }

        impl From<coro_core::Node<$kind>> for $name {
            fn from(node: coro_core::Node<$kind>) -> Self {
                Self(node)
            }
        }

        impl core::ops::Deref for $name {
            type Target = coro_core::Node<$kind>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl core::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }
    };
}
