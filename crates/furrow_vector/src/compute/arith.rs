use crate::selection::{self, SelectionVector};
use crate::vector::Vector;
use furrow_error::{FurrowError, Result};

/// Element-wise scalar arithmetic over address vectors, in place.
///
/// Only `Pointer` vectors participate in address computation; other types
/// are rejected like any unsupported kernel input.
macro_rules! pointer_op {
    ($vec:ident, $sel:ident, $op:expr) => {{
        match $vec.type_id() {
            crate::datatype::TypeId::Pointer => {
                let rows = selection::num_rows($sel, $vec.count());
                for idx in 0..rows {
                    let loc = selection::get_unchecked($sel, idx);
                    let value = $vec.get::<u64>(loc);
                    $vec.set::<u64>(loc, $op(value));
                }
                Ok(())
            }
            other => Err(FurrowError::new(format!(
                "Unsupported arithmetic operation on {other:?} vector"
            ))),
        }
    }};
}

pub fn add_scalar(vec: &mut Vector, rhs: u64, sel: Option<&SelectionVector>) -> Result<()> {
    pointer_op!(vec, sel, |value: u64| value.wrapping_add(rhs))
}

pub fn multiply_scalar(vec: &mut Vector, rhs: u64, sel: Option<&SelectionVector>) -> Result<()> {
    pointer_op!(vec, sel, |value: u64| value.wrapping_mul(rhs))
}

pub fn modulo_scalar(vec: &mut Vector, rhs: u64, sel: Option<&SelectionVector>) -> Result<()> {
    if rhs == 0 {
        return Err(FurrowError::new("Modulo by zero"));
    }
    pointer_op!(vec, sel, |value: u64| value % rhs)
}
