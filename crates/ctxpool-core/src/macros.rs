//! Declaration macro for context interfaces.

/// Declares a context interface trait together with its schema.
///
/// The trait gets `Send + Sync` supertraits, and `dyn Trait` implements
/// `ContextInterface` with a schema built from the trait's own operation
/// tokens, so the fingerprint always follows the declared signatures.
///
/// An optional `[cpu]`, `[memory]`, `[device]` or `[compiler]` tag after the
/// supertraits selects the capability family; untagged interfaces are
/// `Generic`.
///
/// ```
/// use ctxpool_core::{ContextInterface, CpuContext};
///
/// ctxpool_core::context_interface! {
///     /// Register file access for Z80-compatible CPUs.
///     pub trait Z80Context: CpuContext [cpu] {
///         fn read_register(&self, index: u8) -> u16;
///         fn write_register(&self, index: u8, value: u16);
///     }
/// }
///
/// let schema = <dyn Z80Context as ContextInterface>::schema();
/// assert_eq!(schema.operations.len(), 2);
/// ```
///
/// Operations must take `&self`; default bodies and generic methods are not
/// supported because they cannot be described structurally.
#[macro_export]
macro_rules! context_interface {
    (@family) => { $crate::Generic };
    (@family cpu) => { $crate::Cpu };
    (@family memory) => { $crate::Memory };
    (@family device) => { $crate::Device };
    (@family compiler) => { $crate::Compiler };

    (@ret) => { $crate::primitives::UNIT_TYPE };
    (@ret $ret:ty) => { stringify!($ret) };

    (
        $(#[$meta:meta])*
        $vis:vis trait $name:ident
            $(: $sup0:ident $(:: $seg0:ident)* $(+ $sup:ident $(:: $seg:ident)*)* )?
            $([$family:ident])?
        {
            $(
                $(#[$fmeta:meta])*
                fn $op:ident(&self $(, $arg:ident : $ty:ty)*) $(-> $ret:ty)?;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis trait $name: $( $sup0 $(:: $seg0)* $(+ $sup $(:: $seg)*)* + )? Send + Sync {
            $(
                $(#[$fmeta])*
                fn $op(&self $(, $arg: $ty)*) $(-> $ret)?;
            )*
        }

        impl $crate::ContextInterface for dyn $name {
            type Family = $crate::context_interface!(@family $($family)?);

            fn schema() -> &'static $crate::ContextSchema {
                static SCHEMA: ::std::sync::OnceLock<$crate::ContextSchema> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    $crate::ContextSchema::new(concat!(module_path!(), "::", stringify!($name)))
                        .with_family(
                            <$crate::context_interface!(@family $($family)?) as $crate::Family>::KIND,
                        )
                        $(
                            .with_operation(
                                stringify!($op),
                                $crate::context_interface!(@ret $($ret)?),
                                {
                                    let params: &[&str] = &[$(stringify!($ty)),*];
                                    params.iter().copied()
                                },
                            )
                        )*
                })
            }
        }
    };
}
