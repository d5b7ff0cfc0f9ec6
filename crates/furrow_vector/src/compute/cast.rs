use crate::datatype::{NativeType, TypeId};
use crate::vector::Vector;
use furrow_error::Result;
use num_traits::AsPrimitive;

fn cast_loop<S, D>(src: &Vector, dst: &mut Vector) -> Result<()>
where
    S: NativeType + AsPrimitive<D>,
    D: NativeType + 'static,
{
    for idx in 0..src.count() {
        dst.set::<D>(idx, src.get::<S>(idx).as_());
    }
    dst.set_count(src.count());

    Ok(())
}

macro_rules! cast_dispatch_dst {
    ($src_native:ty, $src:ident, $dst:ident) => {
        match $dst.type_id() {
            TypeId::TinyInt => cast_loop::<$src_native, i8>($src, $dst),
            TypeId::SmallInt => cast_loop::<$src_native, i16>($src, $dst),
            TypeId::Integer | TypeId::Date => cast_loop::<$src_native, i32>($src, $dst),
            TypeId::BigInt => cast_loop::<$src_native, i64>($src, $dst),
            TypeId::Decimal => cast_loop::<$src_native, f64>($src, $dst),
            TypeId::Pointer => cast_loop::<$src_native, u64>($src, $dst),
        }
    };
}

/// Element-wise numeric conversion from `src` into `dst`.
///
/// Conversion follows `as`-cast semantics: integer narrowing truncates and
/// sign conversion wraps, matching the address pipeline's widening of signed
/// 32-bit hashes into unsigned pointer-width values.
pub fn cast(src: &Vector, dst: &mut Vector) -> Result<()> {
    match src.type_id() {
        TypeId::TinyInt => cast_dispatch_dst!(i8, src, dst),
        TypeId::SmallInt => cast_dispatch_dst!(i16, src, dst),
        TypeId::Integer | TypeId::Date => cast_dispatch_dst!(i32, src, dst),
        TypeId::BigInt => cast_dispatch_dst!(i64, src, dst),
        TypeId::Decimal => cast_dispatch_dst!(f64, src, dst),
        TypeId::Pointer => cast_dispatch_dst!(u64, src, dst),
    }
}
