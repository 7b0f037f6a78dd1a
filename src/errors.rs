use std::fmt::Display;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SGError
{
    /// Refinement or coarsening was requested on a storage without points.
    StorageEmpty,
    /// Attempt to remove a point that still has children.
    NonLeafRemoval,
    InvalidIndex,
    LZ4DecompressionFailed,
    SerializationFailed,
    DeserializationFailed,
    FileIOError,
}
impl std::error::Error for SGError {}

impl Display for SGError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", *self)
    }
}
