/// Convenience macro that allows creating a Vec3 without needing to use f32 literals
///
/// ```
/// use photon::{vec3f, Vec3f};
/// assert_eq!(vec3f!(1, 2, 3), Vec3f::new(1.0, 2.0, 3.0));
/// ```
///
#[macro_export]
macro_rules! vec3f {
    ($x:expr, $y:expr, $z:expr) => {
        $crate::Vec3f::new($x as $crate::Float, $y as $crate::Float, $z as $crate::Float)
    };
}

#[macro_export]
macro_rules! point3f {
    ( ($x:expr , $y:expr , $z:expr) ) => { $crate::Point3f::new($x as $crate::Float, $y as $crate::Float, $z as $crate::Float)};
    ($x:expr , $y:expr , $z:expr) => { $crate::Point3f::new($x as $crate::Float, $y as $crate::Float, $z as $crate::Float)};
}

#[macro_export]
macro_rules! bounds3f {
    ( $p1:tt, $p2:tt ) => {
       $crate::Bounds3f::with_bounds($crate::point3f![$p1], $crate::point3f![$p2])
    };
}

#[macro_export]
macro_rules! sq {
    ($x:expr) => {{
        let x = $x;
        x * x
    }};
}

/// Declares the kind tag of a handle family. Every variant is listed here once; tags are stored
/// as plain `u32` inside arena records and decoded with `TryFrom<u32>`.
///
/// ```
/// use photon::tagged_kind;
/// tagged_kind! {
///     pub enum Fruit { Apple = 0, Pear = 1 }
/// }
/// assert_eq!(Fruit::try_from(1u32).unwrap(), Fruit::Pear);
/// assert!(Fruit::try_from(7u32).is_err());
/// ```
#[macro_export]
macro_rules! tagged_kind {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident { $($variant:ident = $val:expr),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u32)]
        $vis enum $name {
            $($variant = $val),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn tag(self) -> u32 {
                self as u32
            }
        }

        impl ::std::convert::TryFrom<u32> for $name {
            type Error = $crate::error::Error;

            fn try_from(tag: u32) -> ::std::result::Result<Self, Self::Error> {
                match tag {
                    $(x if x == $val => Ok($name::$variant),)+
                    _ => Err($crate::error::Error::InvalidInput(
                        format!("unknown {} tag {}", stringify!($name), tag)
                    )),
                }
            }
        }
    };
}

/// Implements [`Relocate`](crate::mem::Relocate) for a record by destructuring it exhaustively.
/// Fields holding handles go in the first list, plain data in `plain`; adding a field to the
/// record without listing it here is a compile error.
#[macro_export]
macro_rules! impl_relocate {
    ($ty:ident { $($handle:ident),* $(,)? } plain { $($plain:ident),* $(,)? }) => {
        impl $crate::mem::Relocate for $ty {
            #[allow(unused_variables)]
            fn relocate(&mut self, region: &mut $crate::mem::StackAllocator) -> $crate::error::Result<()> {
                let $ty { $($handle,)* $($plain: _,)* } = self;
                $( $crate::mem::Relocate::relocate($handle, region)?; )*
                Ok(())
            }
        }
    };
}
