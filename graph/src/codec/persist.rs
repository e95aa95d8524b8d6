use super::context::{LoadContext, SaveContext};
use super::error::{DecodeError, EncodeError};
use crate::kind::{Kind, Object};

/// A kind with a hand-written file layout.
///
/// Kinds registered through
/// [`register_persist`](crate::TypeRegistryBuilder::register_persist) are
/// written by these methods instead of the plain field list. Implementations
/// usually start with [`SaveContext::write_fields`] /
/// [`LoadContext::read_fields`] and append whatever the reflected fields
/// cannot express (payload blocks, child objects, lists of references).
pub trait Persist: Kind {
    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<(), EncodeError>;

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), DecodeError>;
}

pub(crate) fn save_erased<T: Persist>(
    object: &dyn Object,
    ctx: &mut SaveContext<'_>,
) -> Result<(), EncodeError> {
    let value = object.downcast_ref::<T>().ok_or_else(|| {
        EncodeError::Invalid(format!(
            "'{}' codec called with a '{}'",
            T::NAME,
            object.kind_name()
        ))
    })?;
    value.save(ctx)
}

pub(crate) fn load_erased<T: Persist>(
    object: &mut dyn Object,
    ctx: &mut LoadContext<'_>,
) -> Result<(), DecodeError> {
    let found = object.kind_name();
    let value = object.downcast_mut::<T>().ok_or_else(|| {
        DecodeError::Invalid(format!("'{}' codec called with a '{found}'", T::NAME))
    })?;
    value.load(ctx)
}
